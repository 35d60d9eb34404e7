use core::hash::Hash;

use ahash::RandomState;

// Fixed seeds keep ids reproducible from one run to the next.
const SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// Hashes a single value to a `u64` that is stable for a given build.
#[inline]
pub fn hash_one<T: Hash + ?Sized>(value: &T) -> u64 {
    RandomState::with_seeds(SEEDS[0], SEEDS[1], SEEDS[2], SEEDS[3]).hash_one(value)
}
