//! Hash tables used throughout the runtime: `hashbrown` tables keyed with
//! the aHash hasher. Construct them with `default()`.

pub mod map {
    pub type HashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;
    pub type HashSet<T> = hashbrown::HashSet<T, ahash::RandomState>;
}
