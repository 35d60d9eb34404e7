//! Hook slots: per-instance state, cached values and effects, addressed by
//! call order within a render.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::collections::map::HashMap;
use crate::deps::Deps;
use crate::error::{HookOrderDetail, HookOrderViolation};
use crate::node::ComponentPath;
use crate::tree::TreeHandle;

pub type Cleanup = Box<dyn FnOnce() + Send>;

type EffectFn = Box<dyn FnOnce() -> Option<Cleanup> + Send>;
type CleanupCell = Arc<Mutex<Option<Cleanup>>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookKind {
    State,
    Cached,
    Effect,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HookKind::State => "use_state",
            HookKind::Cached => "use_cached",
            HookKind::Effect => "use_effect",
        })
    }
}

#[derive(Clone)]
pub(crate) enum HookSlot {
    State(Arc<dyn Any + Send + Sync>),
    Cached {
        deps: Deps,
        value: Arc<dyn Any + Send + Sync>,
    },
    Effect {
        deps: Option<Deps>,
        cleanup: CleanupCell,
    },
}

impl HookSlot {
    fn kind(&self) -> HookKind {
        match self {
            HookSlot::State(_) => HookKind::State,
            HookSlot::Cached { .. } => HookKind::Cached,
            HookSlot::Effect { .. } => HookKind::Effect,
        }
    }
}

/// The slots of one component instance after a successful render.
#[derive(Clone, Default)]
pub struct HookSlots {
    slots: Vec<HookSlot>,
}

impl HookSlots {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// `true` when `other` continues this instance: every effect slot shares
    /// its cleanup cell. A re-created instance gets fresh cells.
    pub(crate) fn continues_into(&self, other: &HookSlots) -> bool {
        self.slots.len() == other.slots.len()
            && self
                .slots
                .iter()
                .zip(&other.slots)
                .all(|(lhs, rhs)| match (lhs, rhs) {
                    (
                        HookSlot::Effect { cleanup: lhs, .. },
                        HookSlot::Effect { cleanup: rhs, .. },
                    ) => Arc::ptr_eq(lhs, rhs),
                    (lhs, rhs) => lhs.kind() == rhs.kind(),
                })
    }

    fn holds_cleanup(&self, cell: &CleanupCell) -> bool {
        self.slots.iter().any(|slot| match slot {
            HookSlot::Effect { cleanup, .. } => Arc::ptr_eq(cleanup, cell),
            _ => false,
        })
    }

    /// Runs the pending cleanup of every effect slot. Called when the
    /// instance leaves the committed tree.
    pub(crate) fn dispose(&self) {
        for slot in &self.slots {
            if let HookSlot::Effect { cleanup, .. } = slot {
                let pending = lock(cleanup).take();
                if let Some(cleanup) = pending {
                    cleanup();
                }
            }
        }
    }
}

/// Hook slots of every instance in a resolved tree, keyed by path.
#[derive(Clone, Default)]
pub struct HookStore {
    instances: HashMap<ComponentPath, HookSlots>,
}

impl HookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &ComponentPath) -> Option<&HookSlots> {
        self.instances.get(path)
    }

    pub fn contains(&self, path: &ComponentPath) -> bool {
        self.instances.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &ComponentPath> {
        self.instances.keys()
    }

    pub(crate) fn insert(&mut self, path: ComponentPath, slots: HookSlots) {
        self.instances.insert(path, slots);
    }

    /// Disposes every instance of `self` that `next` does not continue: its
    /// path is gone, or the path now holds a re-created instance. Returns how
    /// many instances were disposed.
    pub(crate) fn dispose_removed(&self, next: &HookStore) -> usize {
        let mut disposed = 0;
        for (path, slots) in &self.instances {
            let continued = next
                .get(path)
                .is_some_and(|successor| slots.continues_into(successor));
            if !continued {
                slots.dispose();
                disposed += 1;
            }
        }
        disposed
    }
}

impl fmt::Debug for HookSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSlots")
            .field("slots", &self.slots.len())
            .finish()
    }
}

impl fmt::Debug for HookStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookStore")
            .field("instances", &self.instances.len())
            .finish()
    }
}

/// An effect queued by a render, run on the main thread after commit.
pub struct PendingEffect {
    path: ComponentPath,
    cleanup: CleanupCell,
    effect: EffectFn,
}

impl PendingEffect {
    pub fn path(&self) -> &ComponentPath {
        &self.path
    }

    /// `true` when `store` still holds the slot this effect was queued for.
    pub(crate) fn is_owned_by(&self, store: &HookStore) -> bool {
        store
            .get(&self.path)
            .is_some_and(|slots| slots.holds_cleanup(&self.cleanup))
    }

    /// Runs the previous cleanup of this slot, then the effect, and stores the
    /// cleanup it returns.
    pub fn run(self) {
        let previous = lock(&self.cleanup).take();
        if let Some(previous) = previous {
            previous();
        }
        let next = (self.effect)();
        *lock(&self.cleanup) = next;
    }
}

impl fmt::Debug for PendingEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingEffect")
            .field("path", &self.path)
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct StateInner<T> {
    value: RwLock<T>,
    owner: TreeHandle,
}

/// Shared handle to a `use_state` slot. Writing through it requests a new
/// resolution pass of the owning tree.
pub struct StateCell<T> {
    inner: Arc<StateInner<T>>,
}

impl<T> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + Sync + 'static> StateCell<T> {
    pub(crate) fn new(value: T, owner: TreeHandle) -> Self {
        Self {
            inner: Arc::new(StateInner {
                value: RwLock::new(value),
                owner,
            }),
        }
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self
            .inner
            .value
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub fn set(&self, value: T) {
        self.update(|slot| *slot = value);
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = {
            let mut guard = self
                .inner
                .value
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            f(&mut guard)
        };
        self.inner.owner.request_resolve();
        result
    }

    pub fn ptr_eq(&self, other: &StateCell<T>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: fmt::Debug> fmt::Debug for StateCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.value.try_read() {
            Ok(value) => f.debug_tuple("StateCell").field(&*value).finish(),
            Err(_) => f.write_str("StateCell(<locked>)"),
        }
    }
}

/// Hook bookkeeping for a single render of a single instance.
pub(crate) struct HookScope<'a> {
    path: &'a ComponentPath,
    previous: Option<&'a HookSlots>,
    owner: &'a TreeHandle,
    slots: Vec<HookSlot>,
    effects: Vec<PendingEffect>,
    violation: Option<HookOrderViolation>,
}

impl<'a> HookScope<'a> {
    pub(crate) fn new(
        path: &'a ComponentPath,
        previous: Option<&'a HookSlots>,
        owner: &'a TreeHandle,
    ) -> Self {
        Self {
            path,
            previous,
            owner,
            slots: Vec::new(),
            effects: Vec::new(),
            violation: None,
        }
    }

    fn previous_slot(&self) -> Option<&'a HookSlot> {
        self.previous.and_then(|prev| prev.slots.get(self.slots.len()))
    }

    fn violation(&mut self, detail: HookOrderDetail) -> HookOrderViolation {
        let violation = HookOrderViolation {
            path: self.path.clone(),
            detail,
        };
        self.violation.get_or_insert_with(|| violation.clone());
        violation
    }

    fn kind_mismatch(&mut self, found: HookKind, previous: &HookSlot) -> HookOrderViolation {
        let index = self.slots.len();
        self.violation(HookOrderDetail::KindMismatch {
            index,
            expected: previous.kind(),
            found,
        })
    }

    pub(crate) fn use_state<T: Send + Sync + 'static>(
        &mut self,
        init: impl FnOnce() -> T,
    ) -> Result<StateCell<T>, HookOrderViolation> {
        let cell = match self.previous_slot() {
            Some(HookSlot::State(value)) => match value.downcast_ref::<StateCell<T>>() {
                Some(cell) => cell.clone(),
                None => {
                    let index = self.slots.len();
                    return Err(self.violation(HookOrderDetail::TypeMismatch {
                        index,
                        expected: type_name::<T>(),
                    }));
                }
            },
            Some(other) => return Err(self.kind_mismatch(HookKind::State, other)),
            None => StateCell::new(init(), self.owner.clone()),
        };
        self.slots.push(HookSlot::State(Arc::new(cell.clone())));
        Ok(cell)
    }

    pub(crate) fn use_cached<T: Clone + Send + Sync + 'static>(
        &mut self,
        deps: Deps,
        compute: impl FnOnce() -> T,
    ) -> Result<T, HookOrderViolation> {
        let reused = match self.previous_slot() {
            Some(HookSlot::Cached {
                deps: previous,
                value,
            }) => {
                if value.downcast_ref::<T>().is_none() {
                    let index = self.slots.len();
                    return Err(self.violation(HookOrderDetail::TypeMismatch {
                        index,
                        expected: type_name::<T>(),
                    }));
                }
                (previous == &deps).then(|| Arc::clone(value))
            }
            Some(other) => return Err(self.kind_mismatch(HookKind::Cached, other)),
            None => None,
        };
        let value = match reused {
            Some(value) => value,
            None => Arc::new(compute()) as Arc<dyn Any + Send + Sync>,
        };
        let result = value.downcast_ref::<T>().cloned();
        self.slots.push(HookSlot::Cached { deps, value });
        // Both branches hold a `T`: the reused slot was type-checked above.
        result.ok_or_else(|| {
            let index = self.slots.len() - 1;
            self.violation(HookOrderDetail::TypeMismatch {
                index,
                expected: type_name::<T>(),
            })
        })
    }

    pub(crate) fn use_effect<F>(
        &mut self,
        deps: Option<Deps>,
        effect: F,
    ) -> Result<(), HookOrderViolation>
    where
        F: FnOnce() -> Option<Cleanup> + Send + 'static,
    {
        let cleanup = match self.previous_slot() {
            Some(HookSlot::Effect {
                deps: previous,
                cleanup,
            }) => {
                if deps.is_some() && previous == &deps {
                    self.slots.push(HookSlot::Effect {
                        deps,
                        cleanup: Arc::clone(cleanup),
                    });
                    return Ok(());
                }
                Arc::clone(cleanup)
            }
            Some(other) => return Err(self.kind_mismatch(HookKind::Effect, other)),
            None => CleanupCell::default(),
        };
        self.effects.push(PendingEffect {
            path: self.path.clone(),
            cleanup: Arc::clone(&cleanup),
            effect: Box::new(effect),
        });
        self.slots.push(HookSlot::Effect { deps, cleanup });
        Ok(())
    }

    /// Drops the slots of a render that failed, surfacing any violation it
    /// hit before failing.
    pub(crate) fn abandon(self) -> Result<(), HookOrderViolation> {
        match self.violation {
            Some(violation) => Err(violation),
            None => Ok(()),
        }
    }

    /// Validates the slot count against the previous render.
    pub(crate) fn finish(self) -> Result<(HookSlots, Vec<PendingEffect>), HookOrderViolation> {
        if let Some(violation) = self.violation {
            return Err(violation);
        }
        if let Some(previous) = self.previous {
            if previous.slots.len() != self.slots.len() {
                return Err(HookOrderViolation {
                    path: self.path.clone(),
                    detail: HookOrderDetail::CountMismatch {
                        expected: previous.slots.len(),
                        actual: self.slots.len(),
                    },
                });
            }
        }
        Ok((HookSlots { slots: self.slots }, self.effects))
    }
}

#[cfg(test)]
#[path = "tests/hooks_tests.rs"]
mod tests;
