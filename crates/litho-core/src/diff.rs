//! Keyed list reconciliation.
//!
//! [`diff`] turns a previous list `P` and a next list `N` into an ordered
//! [`ChangeSet`]. Applying the changes in order to `P` yields `N`:
//!
//! 1. deletes, highest index first;
//! 2. inserts and moves, placing `N` from its tail so every item lands in front
//!    of its already placed successor. Items on the longest increasing
//!    subsequence of previous positions stay where they are;
//! 3. updates for retained items whose content is not equivalent, by final
//!    index.

use std::fmt;
use std::hash::Hash;

use indexmap::IndexMap;

use crate::error::LithoError;

/// An item that can be reconciled by key.
pub trait Diffable {
    type Key: Clone + Eq + Hash + fmt::Debug;

    fn diff_key(&self) -> &Self::Key;

    /// `true` when the item can be kept without rebinding.
    fn is_content_equivalent(&self, other: &Self) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Insert,
    Delete,
    Update,
    Move,
}

/// A single reconciliation step. Indices refer to the list as it stands after
/// every earlier change has been applied; `next_index` points into `N`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change<K> {
    Insert { index: usize, next_index: usize, key: K },
    Delete { index: usize, key: K },
    Update { index: usize, next_index: usize, key: K },
    Move { from: usize, to: usize, key: K },
}

impl<K> Change<K> {
    pub fn kind(&self) -> ChangeKind {
        match self {
            Change::Insert { .. } => ChangeKind::Insert,
            Change::Delete { .. } => ChangeKind::Delete,
            Change::Update { .. } => ChangeKind::Update,
            Change::Move { .. } => ChangeKind::Move,
        }
    }

    pub fn key(&self) -> &K {
        match self {
            Change::Insert { key, .. }
            | Change::Delete { key, .. }
            | Change::Update { key, .. }
            | Change::Move { key, .. } => key,
        }
    }

    /// The position this change touches; the destination for moves.
    pub fn index(&self) -> usize {
        match self {
            Change::Insert { index, .. }
            | Change::Delete { index, .. }
            | Change::Update { index, .. } => *index,
            Change::Move { to, .. } => *to,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeCounts {
    pub inserts: usize,
    pub deletes: usize,
    pub updates: usize,
    pub moves: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeSet<K> {
    changes: Vec<Change<K>>,
}

impl<K> Default for ChangeSet<K> {
    fn default() -> Self {
        Self {
            changes: Vec::new(),
        }
    }
}

impl<K> ChangeSet<K> {
    pub fn from_changes(changes: Vec<Change<K>>) -> Self {
        Self { changes }
    }

    pub fn changes(&self) -> &[Change<K>] {
        &self.changes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change<K>> {
        self.changes.iter()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn into_changes(self) -> Vec<Change<K>> {
        self.changes
    }

    pub fn counts(&self) -> ChangeCounts {
        let mut counts = ChangeCounts::default();
        for change in &self.changes {
            match change.kind() {
                ChangeKind::Insert => counts.inserts += 1,
                ChangeKind::Delete => counts.deletes += 1,
                ChangeKind::Update => counts.updates += 1,
                ChangeKind::Move => counts.moves += 1,
            }
        }
        counts
    }

    /// Applies the changes to `items` in order, taking inserted and updated
    /// values from `next`.
    ///
    /// # Panics
    ///
    /// Panics if the change set was not produced for `items` and `next`.
    pub fn apply<T: Clone>(&self, items: &mut Vec<T>, next: &[T]) {
        for change in &self.changes {
            match *change {
                Change::Insert {
                    index, next_index, ..
                } => items.insert(index, next[next_index].clone()),
                Change::Delete { index, .. } => {
                    items.remove(index);
                }
                Change::Update {
                    index, next_index, ..
                } => items[index] = next[next_index].clone(),
                Change::Move { from, to, .. } => {
                    let item = items.remove(from);
                    items.insert(to, item);
                }
            }
        }
    }
}

impl<'a, K> IntoIterator for &'a ChangeSet<K> {
    type Item = &'a Change<K>;
    type IntoIter = std::slice::Iter<'a, Change<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

fn index_keys<'a, T: Diffable>(
    items: &'a [T],
    side: &'static str,
) -> Result<IndexMap<&'a T::Key, usize>, LithoError> {
    let mut index = IndexMap::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let key = item.diff_key();
        if index.insert(key, position).is_some() {
            return Err(LithoError::IdentityKeyCollision {
                key: format!("{key:?}"),
                side,
            });
        }
    }
    Ok(index)
}

/// Computes the changes that turn `previous` into `next`.
pub fn diff<T: Diffable>(previous: &[T], next: &[T]) -> Result<ChangeSet<T::Key>, LithoError> {
    let previous_index = index_keys(previous, "previous")?;
    let next_index = index_keys(next, "next")?;
    let mut changes = Vec::new();

    for (index, item) in previous.iter().enumerate().rev() {
        let key = item.diff_key();
        if !next_index.contains_key(key) {
            changes.push(Change::Delete {
                index,
                key: key.clone(),
            });
        }
    }

    // Retained keys in previous order, as the list stands after the deletes.
    let mut working: Vec<&T::Key> = previous
        .iter()
        .map(Diffable::diff_key)
        .filter(|key| next_index.contains_key(*key))
        .collect();

    let retained_position: IndexMap<&T::Key, usize> = working
        .iter()
        .enumerate()
        .map(|(position, key)| (*key, position))
        .collect();
    let sequence: Vec<Option<usize>> = next
        .iter()
        .map(|item| retained_position.get(item.diff_key()).copied())
        .collect();
    let stable = longest_increasing_subsequence(&sequence);

    for next_position in (0..next.len()).rev() {
        let key = next[next_position].diff_key();
        let anchor = match next.get(next_position + 1) {
            Some(successor) => position_of(&working, successor.diff_key()),
            None => working.len(),
        };
        match sequence[next_position] {
            None => {
                working.insert(anchor, key);
                changes.push(Change::Insert {
                    index: anchor,
                    next_index: next_position,
                    key: key.clone(),
                });
            }
            Some(_) if stable[next_position] => {}
            Some(_) => {
                let from = position_of(&working, key);
                let to = if from < anchor { anchor - 1 } else { anchor };
                if from != to {
                    let moved = working.remove(from);
                    working.insert(to, moved);
                    changes.push(Change::Move {
                        from,
                        to,
                        key: key.clone(),
                    });
                }
            }
        }
    }

    for (index, item) in next.iter().enumerate() {
        let key = item.diff_key();
        if let Some(&previous_position) = previous_index.get(key) {
            if !previous[previous_position].is_content_equivalent(item) {
                changes.push(Change::Update {
                    index,
                    next_index: index,
                    key: key.clone(),
                });
            }
        }
    }

    Ok(ChangeSet { changes })
}

fn position_of<K: Eq>(working: &[&K], key: &K) -> usize {
    // Every key looked up here was placed in `working` earlier in the pass.
    working
        .iter()
        .position(|candidate| *candidate == key)
        .unwrap_or(working.len())
}

/// Marks the entries of one longest strictly increasing subsequence of the
/// `Some` values. `None` entries are never marked.
fn longest_increasing_subsequence(sequence: &[Option<usize>]) -> Vec<bool> {
    let mut tails: Vec<usize> = Vec::new();
    let mut parent: Vec<Option<usize>> = vec![None; sequence.len()];
    for (position, value) in sequence.iter().enumerate() {
        let Some(value) = *value else { continue };
        let slot = tails.partition_point(|&tail| sequence[tail].is_some_and(|t| t < value));
        parent[position] = slot.checked_sub(1).map(|previous| tails[previous]);
        if slot == tails.len() {
            tails.push(position);
        } else {
            tails[slot] = position;
        }
    }

    let mut stable = vec![false; sequence.len()];
    let mut cursor = tails.last().copied();
    while let Some(position) = cursor {
        stable[position] = true;
        cursor = parent[position];
    }
    stable
}

#[cfg(test)]
#[path = "tests/diff_tests.rs"]
mod tests;
