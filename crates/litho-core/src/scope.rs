use std::any::Any;
use std::sync::Arc;

use crate::deps::Deps;
use crate::error::HookOrderViolation;
use crate::hooks::{Cleanup, HookScope, HookSlots, PendingEffect, StateCell};
use crate::node::ComponentPath;
use crate::tree::TreeHandle;
use crate::tree_props::TreeProps;

/// Handed to [`Component::render`](crate::Component::render): hooks for the
/// instance being rendered plus read/write access to tree props.
pub struct ComponentScope<'a> {
    hooks: HookScope<'a>,
    path: &'a ComponentPath,
    inherited: &'a TreeProps,
    for_children: Option<TreeProps>,
}

impl<'a> ComponentScope<'a> {
    pub(crate) fn new(
        path: &'a ComponentPath,
        previous: Option<&'a HookSlots>,
        inherited: &'a TreeProps,
        owner: &'a TreeHandle,
    ) -> Self {
        Self {
            hooks: HookScope::new(path, previous, owner),
            path,
            inherited,
            for_children: None,
        }
    }

    pub fn path(&self) -> &ComponentPath {
        self.path
    }

    pub fn use_state<T: Send + Sync + 'static>(
        &mut self,
        init: impl FnOnce() -> T,
    ) -> Result<StateCell<T>, HookOrderViolation> {
        self.hooks.use_state(init)
    }

    pub fn use_cached<T: Clone + Send + Sync + 'static>(
        &mut self,
        deps: Deps,
        compute: impl FnOnce() -> T,
    ) -> Result<T, HookOrderViolation> {
        self.hooks.use_cached(deps, compute)
    }

    /// Schedules `effect` to run after the next commit. With `Some(deps)` it
    /// only runs when the deps changed since the last render; with `None` it
    /// runs after every commit.
    pub fn use_effect<F>(&mut self, deps: Option<Deps>, effect: F) -> Result<(), HookOrderViolation>
    where
        F: FnOnce() -> Option<Cleanup> + Send + 'static,
    {
        self.hooks.use_effect(deps, effect)
    }

    /// Nearest value set by an ancestor. A component never observes a value it
    /// set itself.
    pub fn tree_prop<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.inherited.get::<T>()
    }

    /// Makes `value` visible to this component's descendants.
    pub fn set_tree_prop<T: Any + Send + Sync>(&mut self, value: T) {
        self.for_children
            .get_or_insert_with(|| self.inherited.clone())
            .insert(value);
    }

    pub(crate) fn abandon(self) -> Result<(), HookOrderViolation> {
        self.hooks.abandon()
    }

    pub(crate) fn finish(self) -> Result<ScopeOutput, HookOrderViolation> {
        let (slots, effects) = self.hooks.finish()?;
        Ok(ScopeOutput {
            slots,
            effects,
            child_props: self.for_children,
        })
    }
}

pub(crate) struct ScopeOutput {
    pub(crate) slots: HookSlots,
    pub(crate) effects: Vec<PendingEffect>,
    pub(crate) child_props: Option<TreeProps>,
}
