//! Mounting: applies [`ChangeSet`]s of render units to live host views,
//! recycling views through per-type pools.

use std::fmt;
use std::hash::Hash;

use crate::collections::map::HashMap;
use crate::component::{ComponentRef, ViewAttrs, ViewType};
use crate::config::{ComponentsConfiguration, RecyclingMode};
use crate::diff::{diff, Change, ChangeSet, Diffable};
use crate::error::{HostError, LithoError, MountError};
use crate::layout::Rect;

/// Owns the platform views of one container.
///
/// Indices passed to `attach`, `detach` and `move_view` count only views that
/// are currently attached to the container.
pub trait MountHost {
    type View;

    fn create_view(&mut self, view_type: &ViewType) -> Result<Self::View, HostError>;

    fn bind(&mut self, view: &mut Self::View, content: &MountContent) -> Result<(), HostError>;

    fn unbind(&mut self, _view: &mut Self::View, _content: &MountContent) {}

    fn attach(&mut self, view: &Self::View, index: usize);

    fn detach(&mut self, view: &Self::View, index: usize);

    fn move_view(&mut self, view: &Self::View, from: usize, to: usize);

    /// Called for views that leave the coordinator without entering a pool.
    fn destroy_view(&mut self, _view: Self::View) {}
}

/// Everything a host needs to bind one view.
#[derive(Clone, Debug)]
pub struct MountContent {
    pub view_type: ViewType,
    pub attrs: ViewAttrs,
    pub bounds: Rect,
    pub component: Option<ComponentRef>,
}

impl MountContent {
    pub fn new(view_type: impl Into<ViewType>) -> Self {
        Self {
            view_type: view_type.into(),
            attrs: ViewAttrs::new(),
            bounds: Rect::default(),
            component: None,
        }
    }

    pub fn is_equivalent(&self, other: &MountContent) -> bool {
        self.view_type == other.view_type
            && self.attrs == other.attrs
            && self.bounds == other.bounds
            && match (&self.component, &other.component) {
                (Some(lhs), Some(rhs)) => lhs.is_equivalent(rhs),
                (None, None) => true,
                _ => false,
            }
    }
}

/// One mountable item produced from a resolved node or a collection child.
#[derive(Clone, Debug)]
pub struct RenderUnit<K> {
    pub key: K,
    pub content: MountContent,
}

impl<K: Clone + Eq + Hash + fmt::Debug> Diffable for RenderUnit<K> {
    type Key = K;

    fn diff_key(&self) -> &K {
        &self.key
    }

    fn is_content_equivalent(&self, other: &Self) -> bool {
        self.content.is_equivalent(&other.content)
    }
}

/// Released views waiting for reuse, keyed by view type.
pub struct RecyclePool<V> {
    pools: HashMap<ViewType, Vec<V>>,
    capacity: Option<usize>,
    mode: RecyclingMode,
}

impl<V> RecyclePool<V> {
    pub fn new(capacity: Option<usize>, mode: RecyclingMode) -> Self {
        Self {
            pools: HashMap::default(),
            capacity,
            mode,
        }
    }

    pub fn from_config(config: &ComponentsConfiguration) -> Self {
        Self::new(config.pool_capacity, config.recycling_mode)
    }

    pub fn acquire(&mut self, view_type: &ViewType) -> Option<V> {
        if self.mode == RecyclingMode::NoPooling {
            return None;
        }
        self.pools.get_mut(view_type)?.pop()
    }

    /// Returns the view back when the pool does not keep it.
    pub fn release(&mut self, view_type: &ViewType, view: V) -> Option<V> {
        match self.mode {
            RecyclingMode::Default => self.push(view_type, view),
            RecyclingMode::NoViewReuse | RecyclingMode::NoPooling => Some(view),
        }
    }

    /// Pre-allocation path: accepted in every mode but `NoPooling`.
    pub fn fill(&mut self, view_type: &ViewType, view: V) -> Option<V> {
        match self.mode {
            RecyclingMode::NoPooling => Some(view),
            RecyclingMode::Default | RecyclingMode::NoViewReuse => self.push(view_type, view),
        }
    }

    fn push(&mut self, view_type: &ViewType, view: V) -> Option<V> {
        let pool = self.pools.entry(view_type.clone()).or_default();
        if self.capacity.is_some_and(|capacity| pool.len() >= capacity) {
            log::debug!("{view_type} pool is full; dropping released view");
            return Some(view);
        }
        pool.push(view);
        None
    }

    pub fn len(&self, view_type: &ViewType) -> usize {
        self.pools.get(view_type).map_or(0, Vec::len)
    }

    pub fn total(&self) -> usize {
        self.pools.values().map(Vec::len).sum()
    }

    pub fn drain(&mut self) -> Vec<V> {
        self.pools.drain().flat_map(|(_, views)| views).collect()
    }
}

impl<V> fmt::Debug for RecyclePool<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecyclePool")
            .field("total", &self.total())
            .field("capacity", &self.capacity)
            .field("mode", &self.mode)
            .finish()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MountReport {
    pub inserted: usize,
    pub deleted: usize,
    pub updated: usize,
    pub moved: usize,
    /// Views newly created through the host.
    pub created: usize,
    /// Views taken from the pool.
    pub recycled: usize,
    pub failures: Vec<MountError>,
}

impl MountReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn merge(&mut self, other: MountReport) {
        self.inserted += other.inserted;
        self.deleted += other.deleted;
        self.updated += other.updated;
        self.moved += other.moved;
        self.created += other.created;
        self.recycled += other.recycled;
        self.failures.extend(other.failures);
    }
}

/// Keeps the mounted units of one container in sync with the host.
///
/// `units[i]` is mounted in `views[i]`; a `None` view is a placeholder left by
/// a bind that failed twice. Placeholders keep indices aligned and are retried
/// on the next update of that unit.
pub struct MountCoordinator<H: MountHost, K> {
    host: H,
    pool: RecyclePool<H::View>,
    units: Vec<RenderUnit<K>>,
    views: Vec<Option<H::View>>,
    retry_failed_binds: bool,
}

impl<H, K> MountCoordinator<H, K>
where
    H: MountHost,
    K: Clone + Eq + Hash + fmt::Debug,
{
    pub fn new(host: H, config: &ComponentsConfiguration) -> Self {
        Self {
            host,
            pool: RecyclePool::from_config(config),
            units: Vec::new(),
            views: Vec::new(),
            retry_failed_binds: config.retry_failed_binds,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn pool(&self) -> &RecyclePool<H::View> {
        &self.pool
    }

    pub fn units(&self) -> &[RenderUnit<K>] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn view(&self, index: usize) -> Option<&H::View> {
        self.views.get(index)?.as_ref()
    }

    pub fn placeholders(&self) -> usize {
        self.views.iter().filter(|view| view.is_none()).count()
    }

    /// Creates `count` views of `view_type` up front and parks them in the
    /// pool. Returns how many the pool accepted.
    pub fn prefill(&mut self, view_type: &ViewType, count: usize) -> Result<usize, MountError> {
        let mut accepted = 0;
        for _ in 0..count {
            let view = self
                .host
                .create_view(view_type)
                .map_err(|source| MountError::CreateFailed {
                    key: "<prefill>".to_owned(),
                    view_type: view_type.clone(),
                    source,
                })?;
            match self.pool.fill(view_type, view) {
                None => accepted += 1,
                Some(rejected) => {
                    self.host.destroy_view(rejected);
                    break;
                }
            }
        }
        Ok(accepted)
    }

    /// Diffs `next` against the mounted units and applies the result.
    pub fn reconcile(&mut self, next: &[RenderUnit<K>]) -> Result<MountReport, LithoError> {
        let changes = diff(&self.units, next)?;
        Ok(self.apply(&changes, next))
    }

    /// Applies `changes` in order. `next` is the list the changes were
    /// computed against.
    pub fn apply(&mut self, changes: &ChangeSet<K>, next: &[RenderUnit<K>]) -> MountReport {
        let mut report = MountReport::default();
        for change in changes {
            match *change {
                Change::Delete { index, .. } => self.delete(index, &mut report),
                Change::Insert {
                    index, next_index, ..
                } => self.insert(index, &next[next_index], &mut report),
                Change::Move { from, to, .. } => self.move_unit(from, to, &mut report),
                Change::Update {
                    index, next_index, ..
                } => self.update(index, &next[next_index], &mut report),
            }
        }
        for failure in &report.failures {
            log::error!("mount failure: {failure}");
        }
        report
    }

    /// Removes every mounted unit, returning views to the pool.
    pub fn unmount_all(&mut self) -> MountReport {
        let mut report = MountReport::default();
        for index in (0..self.units.len()).rev() {
            self.delete(index, &mut report);
        }
        report
    }

    fn host_index(&self, slot: usize) -> usize {
        self.views[..slot].iter().filter(|view| view.is_some()).count()
    }

    fn insert(&mut self, index: usize, unit: &RenderUnit<K>, report: &mut MountReport) {
        let view = self.mount_view(unit, report);
        if let Some(view) = &view {
            let at = self.host_index(index);
            self.host.attach(view, at);
        }
        self.units.insert(index, unit.clone());
        self.views.insert(index, view);
        report.inserted += 1;
    }

    fn delete(&mut self, index: usize, report: &mut MountReport) {
        let at = self.host_index(index);
        let unit = self.units.remove(index);
        if let Some(mut view) = self.views.remove(index) {
            self.host.detach(&view, at);
            self.host.unbind(&mut view, &unit.content);
            self.release(&unit.content.view_type, view);
        }
        report.deleted += 1;
    }

    fn move_unit(&mut self, from: usize, to: usize, report: &mut MountReport) {
        let host_from = self.host_index(from);
        let unit = self.units.remove(from);
        let view = self.views.remove(from);
        self.units.insert(to, unit);
        self.views.insert(to, view);
        if let Some(view) = &self.views[to] {
            let host_to = self.host_index(to);
            self.host.move_view(view, host_from, host_to);
        }
        report.moved += 1;
    }

    fn update(&mut self, index: usize, unit: &RenderUnit<K>, report: &mut MountReport) {
        let at = self.host_index(index);
        let previous = std::mem::replace(&mut self.units[index], unit.clone());
        let view = match self.views[index].take() {
            Some(mut view) => {
                self.host.unbind(&mut view, &previous.content);
                if previous.content.view_type != unit.content.view_type {
                    self.host.detach(&view, at);
                    self.release(&previous.content.view_type, view);
                    self.mount_view(unit, report)
                } else {
                    match self.host.bind(&mut view, &unit.content) {
                        Ok(()) => {
                            self.views[index] = Some(view);
                            report.updated += 1;
                            return;
                        }
                        Err(source) => {
                            self.host.detach(&view, at);
                            self.host.destroy_view(view);
                            self.recover_bind(unit, source, report)
                        }
                    }
                }
            }
            None => self.mount_view(unit, report),
        };
        if let Some(view) = &view {
            self.host.attach(view, at);
        }
        self.views[index] = view;
        report.updated += 1;
    }

    /// Binds `unit` to a pooled or new view.
    fn mount_view(&mut self, unit: &RenderUnit<K>, report: &mut MountReport) -> Option<H::View> {
        let view_type = &unit.content.view_type;
        let mut view = match self.pool.acquire(view_type) {
            Some(view) => {
                report.recycled += 1;
                view
            }
            None => self.create(unit, report)?,
        };
        match self.host.bind(&mut view, &unit.content) {
            Ok(()) => Some(view),
            Err(source) => {
                self.host.destroy_view(view);
                self.recover_bind(unit, source, report)
            }
        }
    }

    /// Second and last attempt after a failed bind, on a freshly created view.
    fn recover_bind(
        &mut self,
        unit: &RenderUnit<K>,
        first: HostError,
        report: &mut MountReport,
    ) -> Option<H::View> {
        if !self.retry_failed_binds {
            report.failures.push(self.bind_failed(unit, first));
            return None;
        }
        log::warn!("bind of {:?} failed ({first}); retrying on a new view", unit.key);
        let mut view = self.create(unit, report)?;
        match self.host.bind(&mut view, &unit.content) {
            Ok(()) => Some(view),
            Err(second) => {
                self.host.destroy_view(view);
                report.failures.push(self.bind_failed(unit, second));
                None
            }
        }
    }

    fn create(&mut self, unit: &RenderUnit<K>, report: &mut MountReport) -> Option<H::View> {
        match self.host.create_view(&unit.content.view_type) {
            Ok(view) => {
                report.created += 1;
                Some(view)
            }
            Err(source) => {
                report.failures.push(MountError::CreateFailed {
                    key: format!("{:?}", unit.key),
                    view_type: unit.content.view_type.clone(),
                    source,
                });
                None
            }
        }
    }

    fn bind_failed(&self, unit: &RenderUnit<K>, source: HostError) -> MountError {
        MountError::BindFailed {
            key: format!("{:?}", unit.key),
            view_type: unit.content.view_type.clone(),
            source,
        }
    }

    fn release(&mut self, view_type: &ViewType, view: H::View) {
        if let Some(rejected) = self.pool.release(view_type, view) {
            self.host.destroy_view(rejected);
        }
    }
}

impl<H: MountHost, K> fmt::Debug for MountCoordinator<H, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountCoordinator")
            .field("units", &self.units.len())
            .field("pool", &self.pool)
            .finish()
    }
}
