use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::collections::map::HashMap;

type PropMap = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// Type-keyed values propagated from a component to its descendants.
///
/// Cloning is cheap; writes fork the underlying map, so a value set for one
/// subtree never leaks into a sibling or an ancestor.
#[derive(Clone, Default)]
pub struct TreeProps {
    values: Option<Arc<PropMap>>,
}

impl TreeProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let value = self.values.as_ref()?.get(&TypeId::of::<T>())?;
        Arc::clone(value).downcast::<T>().ok()
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.values
            .as_ref()
            .is_some_and(|values| values.contains_key(&TypeId::of::<T>()))
    }

    /// Returns a fork holding `value`; `self` is left untouched.
    pub fn with<T: Any + Send + Sync>(&self, value: T) -> TreeProps {
        let mut forked = self.clone();
        forked.insert(value);
        forked
    }

    pub(crate) fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        let values = self.values.get_or_insert_with(Default::default);
        Arc::make_mut(values).insert(TypeId::of::<T>(), Arc::new(value));
    }

    pub fn len(&self) -> usize {
        self.values.as_ref().map_or(0, |values| values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for TreeProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeProps")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/tree_props_tests.rs"]
mod tests;
