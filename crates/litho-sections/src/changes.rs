use std::ops::RangeInclusive;

use litho_core::{Change, ChangeCounts, ChangeSet};

/// The changes produced for one collection update, with helpers for the
/// portion a viewport can see.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangesInfo<K> {
    changes: ChangeSet<K>,
}

impl<K> ChangesInfo<K> {
    pub fn new(changes: ChangeSet<K>) -> Self {
        Self { changes }
    }

    pub fn changes(&self) -> &ChangeSet<K> {
        &self.changes
    }

    pub fn counts(&self) -> ChangeCounts {
        self.changes.counts()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Changes touching positions `first..=last` of a section that starts at
    /// `global_offset` in the host list. A move is visible when either end
    /// is.
    pub fn visible_changes(&self, first: usize, last: usize, global_offset: usize) -> Vec<&Change<K>> {
        let window = (first + global_offset)..=(last + global_offset);
        self.changes
            .iter()
            .filter(|change| touches(change, &window))
            .collect()
    }
}

fn touches<K>(change: &Change<K>, window: &RangeInclusive<usize>) -> bool {
    match change {
        Change::Move { from, to, .. } => window.contains(from) || window.contains(to),
        other => window.contains(&other.index()),
    }
}

impl<K> From<ChangeSet<K>> for ChangesInfo<K> {
    fn from(changes: ChangeSet<K>) -> Self {
        Self::new(changes)
    }
}
