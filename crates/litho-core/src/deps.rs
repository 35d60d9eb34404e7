//! Dependency arrays for `use_cached`, `use_effect` and collection children.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A single element of a dependency array. Implemented for every
/// `PartialEq + Debug` value that can cross threads.
pub trait Dep: Any + fmt::Debug + Send + Sync {
    fn dep_eq(&self, other: &dyn Dep) -> bool;
    fn as_any_dep(&self) -> &dyn Any;
}

impl<T> Dep for T
where
    T: Any + PartialEq + fmt::Debug + Send + Sync,
{
    fn dep_eq(&self, other: &dyn Dep) -> bool {
        other
            .as_any_dep()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }

    fn as_any_dep(&self) -> &dyn Any {
        self
    }
}

/// An ordered dependency array compared element-wise by value.
#[derive(Clone, Default)]
pub struct Deps {
    values: Vec<Arc<dyn Dep>>,
}

impl Deps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Dep>(mut self, value: T) -> Self {
        self.values.push(Arc::new(value));
        self
    }

    pub fn push<T: Dep>(&mut self, value: T) {
        self.values.push(Arc::new(value));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PartialEq for Deps {
    fn eq(&self, other: &Self) -> bool {
        self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(other.values.iter())
                .all(|(lhs, rhs)| lhs.dep_eq(rhs.as_ref()))
    }
}

impl fmt::Debug for Deps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values.iter()).finish()
    }
}

/// Builds a [`Deps`] array: `deps![user_id, filter.clone()]`.
#[macro_export]
macro_rules! deps {
    () => {
        $crate::Deps::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Deps::new()$(.with($value))+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_values_compare_equal() {
        assert_eq!(deps![5, "a"], deps![5, "a"]);
        assert_eq!(Deps::new(), deps![]);
    }

    #[test]
    fn differing_values_or_types_are_unequal() {
        assert_ne!(deps![5], deps![6]);
        assert_ne!(deps![5i32], deps![5i64]);
        assert_ne!(deps![5], deps![5, 5]);
    }
}
