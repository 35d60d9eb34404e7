//! The component tree: owns the root, schedules resolution passes, and hands
//! resolved layouts to the main thread for mounting.
//!
//! Every request bumps a generation counter. A pass that is no longer the
//! latest generation when it reaches a check point or tries to publish is
//! dropped and counted as a cancellation. Published layouts are immutable and
//! replace any layout that is still waiting to be mounted.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::component::ComponentRef;
use crate::config::ComponentsConfiguration;
use crate::error::{LithoError, ResolutionErrors};
use crate::hooks::{HookStore, PendingEffect};
use crate::layout::{Constraints, LayoutBox, LayoutSolver, StackLayoutSolver};
use crate::mount::{MountContent, MountCoordinator, MountHost, MountReport, RenderUnit};
use crate::node::{ComponentPath, InternalNode};
use crate::platform::{ImmediateScheduler, Scheduler};
use crate::resolve::{CancellationToken, Resolver};
use crate::tree_props::TreeProps;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Weak handle used by state cells to request re-resolution of their tree.
#[derive(Clone)]
pub struct TreeHandle(Weak<TreeShared>);

impl TreeHandle {
    /// A handle that belongs to no tree; requests are ignored.
    pub fn detached() -> Self {
        Self(Weak::new())
    }

    pub fn is_attached(&self) -> bool {
        self.0.strong_count() > 0
    }

    /// Returns the requested generation, or `None` if the tree is gone.
    pub fn request_resolve(&self) -> Option<u64> {
        self.0.upgrade().map(|shared| shared.request_resolve())
    }
}

impl fmt::Debug for TreeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeHandle")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// An immutable resolved and measured tree, ready to mount.
pub struct LayoutState {
    pub generation: u64,
    pub root: Option<InternalNode>,
    pub layout: Option<LayoutBox>,
    pub units: Vec<RenderUnit<ComponentPath>>,
    hooks: Arc<HookStore>,
}

impl LayoutState {
    pub fn hooks(&self) -> &HookStore {
        &self.hooks
    }

    pub fn find(&self, path: &ComponentPath) -> Option<&InternalNode> {
        self.root.as_ref()?.find(path)
    }
}

impl fmt::Debug for LayoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutState")
            .field("generation", &self.generation)
            .field("units", &self.units.len())
            .finish()
    }
}

struct PendingCommit {
    state: Arc<LayoutState>,
    effects: Vec<PendingEffect>,
    failures: ResolutionErrors,
}

/// Outcome of mounting one layout.
#[derive(Debug, Clone)]
pub struct CommitReport {
    pub generation: u64,
    pub mount: MountReport,
    /// Render failures of the pass that produced this layout. The rest of the
    /// tree was committed regardless.
    pub resolution_failures: ResolutionErrors,
    pub effects_run: usize,
    /// Instances that left the tree and had their effect cleanups run.
    pub disposed: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub requested: u64,
    pub published: u64,
    pub committed: u64,
    pub cancelled: u64,
    pub failed: u64,
}

#[derive(Default)]
struct StatsCounters {
    requested: AtomicU64,
    published: AtomicU64,
    committed: AtomicU64,
    cancelled: AtomicU64,
    failed: AtomicU64,
}

impl StatsCounters {
    fn snapshot(&self) -> TreeStats {
        TreeStats {
            requested: self.requested.load(Ordering::SeqCst),
            published: self.published.load(Ordering::SeqCst),
            committed: self.committed.load(Ordering::SeqCst),
            cancelled: self.cancelled.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

struct TreeInputs {
    root: Option<ComponentRef>,
    props: TreeProps,
    constraints: Constraints,
}

type ReadyListener = Arc<dyn Fn(u64) + Send + Sync>;

pub(crate) struct TreeShared {
    config: ComponentsConfiguration,
    scheduler: Arc<dyn Scheduler>,
    solver: Arc<dyn LayoutSolver>,
    inputs: Mutex<TreeInputs>,
    /// Hook store of the most recently published pass; the basis for the next.
    resolved_hooks: Mutex<Arc<HookStore>>,
    latest: Arc<AtomicU64>,
    pending: Mutex<Option<PendingCommit>>,
    last_error: Mutex<Option<LithoError>>,
    on_ready: Mutex<Option<ReadyListener>>,
    stats: StatsCounters,
}

impl TreeShared {
    fn next_generation(&self) -> u64 {
        self.stats.requested.fetch_add(1, Ordering::SeqCst);
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn request_resolve(self: &Arc<Self>) -> u64 {
        let generation = self.next_generation();
        let shared = Arc::clone(self);
        self.scheduler.run_on_background(Box::new(move || {
            // Failures are recorded by the pass itself.
            let _ = shared.run_pass(generation);
        }));
        generation
    }

    fn run_pass(self: &Arc<Self>, generation: u64) -> Result<ResolutionErrors, LithoError> {
        let token = CancellationToken::new(generation, Arc::clone(&self.latest));
        let result = self.resolve_and_publish(&token);
        match &result {
            Ok(_) => {}
            Err(LithoError::NoRoot) => log::debug!("resolution pass {generation} skipped: no root"),
            Err(err) if err.is_cancellation() => {
                self.stats.cancelled.fetch_add(1, Ordering::SeqCst);
                log::debug!("resolution pass {generation} superseded");
            }
            Err(err) => {
                self.stats.failed.fetch_add(1, Ordering::SeqCst);
                log::error!("resolution pass {generation} failed: {err}");
                *lock(&self.last_error) = Some(err.clone());
            }
        }
        result
    }

    fn resolve_and_publish(
        self: &Arc<Self>,
        token: &CancellationToken,
    ) -> Result<ResolutionErrors, LithoError> {
        token.check()?;
        let (root, props, constraints) = {
            let inputs = lock(&self.inputs);
            (inputs.root.clone(), inputs.props.clone(), inputs.constraints)
        };
        let root = root.ok_or(LithoError::NoRoot)?;
        let basis = Arc::clone(&lock(&self.resolved_hooks));
        let owner = TreeHandle(Arc::downgrade(self));

        let output = Resolver::new(&basis, &owner, token)
            .parallel(self.config.parallel_resolution)
            .resolve(&root, &props)?;

        let layout = output
            .root
            .as_ref()
            .map(|node| self.solver.solve(node, constraints));
        let mut units = Vec::new();
        if let (Some(node), Some(layout)) = (&output.root, &layout) {
            collect_units(node, layout, &mut units);
        }
        let state = LayoutState {
            generation: token.generation(),
            root: output.root,
            layout,
            units,
            hooks: Arc::new(output.hooks),
        };
        let failures = output.failures;
        self.publish(token, state, output.effects, failures.clone())?;
        Ok(failures)
    }

    fn publish(
        &self,
        token: &CancellationToken,
        state: LayoutState,
        effects: Vec<PendingEffect>,
        failures: ResolutionErrors,
    ) -> Result<(), LithoError> {
        let generation = state.generation;
        let listener = {
            let mut pending = lock(&self.pending);
            token.check()?;
            let mut effects = effects;
            if let Some(stale) = pending.take() {
                // The replaced layout never mounted. Its effects are still owed
                // to instances that survive into this one.
                log::debug!(
                    "layout {} replaced by {generation} before mounting",
                    stale.state.generation
                );
                let mut carried: Vec<PendingEffect> = stale
                    .effects
                    .into_iter()
                    .filter(|effect| effect.is_owned_by(&state.hooks))
                    .collect();
                carried.append(&mut effects);
                effects = carried;
            }
            *lock(&self.resolved_hooks) = Arc::clone(&state.hooks);
            *pending = Some(PendingCommit {
                state: Arc::new(state),
                effects,
                failures,
            });
            self.stats.published.fetch_add(1, Ordering::SeqCst);
            lock(&self.on_ready).clone()
        };
        if let Some(listener) = listener {
            self.scheduler
                .run_on_main(Box::new(move || listener(generation)));
        }
        Ok(())
    }
}

/// Mountable nodes in pre-order, with their measured bounds.
fn collect_units(node: &InternalNode, layout: &LayoutBox, out: &mut Vec<RenderUnit<ComponentPath>>) {
    if let Some(mount) = &node.mount {
        out.push(RenderUnit {
            key: node.path.clone(),
            content: MountContent {
                view_type: mount.view_type.clone(),
                attrs: mount.attrs.clone(),
                bounds: layout.rect,
                component: node.host().cloned(),
            },
        });
    }
    for (child, child_layout) in node.children.iter().zip(&layout.children) {
        collect_units(child, child_layout, out);
    }
}

/// Entry point for hosts: set a root, resolve, and mount the result.
///
/// Resolution runs through the [`Scheduler`]; [`ComponentTree::mount`] must be
/// called on the thread that owns the coordinator.
pub struct ComponentTree {
    shared: Arc<TreeShared>,
    mounted: Option<Arc<LayoutState>>,
    mounted_hooks: Arc<HookStore>,
}

impl ComponentTree {
    pub fn new(
        config: ComponentsConfiguration,
        scheduler: Arc<dyn Scheduler>,
        solver: Arc<dyn LayoutSolver>,
    ) -> Self {
        Self {
            shared: Arc::new(TreeShared {
                config,
                scheduler,
                solver,
                inputs: Mutex::new(TreeInputs {
                    root: None,
                    props: TreeProps::new(),
                    constraints: Constraints::unbounded(),
                }),
                resolved_hooks: Mutex::new(Arc::new(HookStore::new())),
                latest: Arc::new(AtomicU64::new(0)),
                pending: Mutex::new(None),
                last_error: Mutex::new(None),
                on_ready: Mutex::new(None),
                stats: StatsCounters::default(),
            }),
            mounted: None,
            mounted_hooks: Arc::new(HookStore::new()),
        }
    }

    /// Inline scheduling with the stacking layout solver.
    pub fn with_config(config: ComponentsConfiguration) -> Self {
        Self::new(config, Arc::new(ImmediateScheduler), Arc::new(StackLayoutSolver))
    }

    pub fn config(&self) -> &ComponentsConfiguration {
        &self.shared.config
    }

    pub fn handle(&self) -> TreeHandle {
        TreeHandle(Arc::downgrade(&self.shared))
    }

    /// Replaces the root and requests a pass. Returns its generation.
    pub fn set_root(&self, root: impl Into<ComponentRef>) -> u64 {
        lock(&self.shared.inputs).root = Some(root.into());
        self.shared.request_resolve()
    }

    /// Replaces the root and resolves on the calling thread.
    pub fn set_root_sync(&self, root: impl Into<ComponentRef>) -> Result<u64, LithoError> {
        lock(&self.shared.inputs).root = Some(root.into());
        self.resolve_sync()
    }

    pub fn set_tree_props(&self, props: TreeProps) -> u64 {
        lock(&self.shared.inputs).props = props;
        self.shared.request_resolve()
    }

    pub fn set_constraints(&self, constraints: Constraints) -> u64 {
        lock(&self.shared.inputs).constraints = constraints;
        self.shared.request_resolve()
    }

    pub fn request_resolve(&self) -> u64 {
        self.shared.request_resolve()
    }

    /// Runs a pass on the calling thread. The layout is published even when
    /// some components failed to render; those failures are returned as
    /// [`LithoError::Resolution`].
    pub fn resolve_sync(&self) -> Result<u64, LithoError> {
        let generation = self.shared.next_generation();
        let failures = self.shared.run_pass(generation)?;
        if failures.is_empty() {
            Ok(generation)
        } else {
            Err(LithoError::Resolution(failures))
        }
    }

    /// Called on the main thread whenever a layout is published.
    pub fn set_on_layout_ready(&self, listener: impl Fn(u64) + Send + Sync + 'static) {
        *lock(&self.shared.on_ready) = Some(Arc::new(listener));
    }

    pub fn has_pending(&self) -> bool {
        lock(&self.shared.pending).is_some()
    }

    pub fn pending_generation(&self) -> Option<u64> {
        lock(&self.shared.pending)
            .as_ref()
            .map(|commit| commit.state.generation)
    }

    /// The last layout that was mounted.
    pub fn committed(&self) -> Option<&Arc<LayoutState>> {
        self.mounted.as_ref()
    }

    pub fn stats(&self) -> TreeStats {
        self.shared.stats.snapshot()
    }

    /// The error of the most recent failed background pass, if any.
    pub fn take_error(&self) -> Option<LithoError> {
        lock(&self.shared.last_error).take()
    }

    /// Mounts the pending layout, if any: applies the unit diff, runs the
    /// cleanups of instances that left the tree, then runs queued effects.
    pub fn mount<H: MountHost>(
        &mut self,
        coordinator: &mut MountCoordinator<H, ComponentPath>,
    ) -> Result<Option<CommitReport>, LithoError> {
        let Some(commit) = lock(&self.shared.pending).take() else {
            return Ok(None);
        };
        let report = match coordinator.reconcile(&commit.state.units) {
            Ok(report) => report,
            Err(err) => {
                log::error!(
                    "cannot mount generation {}: {err}",
                    commit.state.generation
                );
                // Nothing was applied; keep the layout unless a newer one
                // arrived meanwhile.
                let mut pending = lock(&self.shared.pending);
                if pending.is_none() {
                    *pending = Some(commit);
                }
                return Err(err);
            }
        };
        let PendingCommit {
            state,
            effects,
            failures,
        } = commit;
        let disposed = self.mounted_hooks.dispose_removed(&state.hooks);
        let effects_run = effects.len();
        for effect in effects {
            effect.run();
        }
        self.mounted_hooks = Arc::clone(&state.hooks);
        self.mounted = Some(Arc::clone(&state));
        self.shared.stats.committed.fetch_add(1, Ordering::SeqCst);
        log::debug!(
            "mounted generation {}: +{} -{} ~{} >{} ({} recycled, {} effect(s), {} disposed)",
            state.generation,
            report.inserted,
            report.deleted,
            report.updated,
            report.moved,
            report.recycled,
            effects_run,
            disposed
        );
        Ok(Some(CommitReport {
            generation: state.generation,
            mount: report,
            resolution_failures: failures,
            effects_run,
            disposed,
        }))
    }

    /// Unmounts everything and disposes every instance. Passes still in
    /// flight are cancelled.
    pub fn release<H: MountHost>(
        &mut self,
        coordinator: &mut MountCoordinator<H, ComponentPath>,
    ) -> MountReport {
        self.shared.next_generation();
        lock(&self.shared.pending).take();
        let report = coordinator.unmount_all();
        self.mounted_hooks.dispose_removed(&HookStore::new());
        self.mounted_hooks = Arc::new(HookStore::new());
        self.mounted = None;
        report
    }
}

impl Default for ComponentTree {
    fn default() -> Self {
        Self::with_config(ComponentsConfiguration::default())
    }
}

impl Drop for ComponentTree {
    fn drop(&mut self) {
        self.shared.latest.fetch_add(1, Ordering::SeqCst);
        self.mounted_hooks.dispose_removed(&HookStore::new());
    }
}

impl fmt::Debug for ComponentTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentTree")
            .field("mounted", &self.mounted.as_ref().map(|state| state.generation))
            .field("stats", &self.stats())
            .finish()
    }
}
