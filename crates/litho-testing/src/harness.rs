use litho_core::{
    CommitReport, ComponentPath, ComponentRef, ComponentTree, ComponentsConfiguration,
    LithoError, MountCoordinator,
};

use crate::host::MemoryViewHost;

/// Installs `env_logger` for tests; safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A tree resolving inline plus a coordinator mounting into a
/// [`MemoryViewHost`].
pub struct TreeHarness {
    pub tree: ComponentTree,
    pub coordinator: MountCoordinator<MemoryViewHost, ComponentPath>,
}

impl TreeHarness {
    pub fn new() -> Self {
        Self::with_config(ComponentsConfiguration::default())
    }

    pub fn with_config(config: ComponentsConfiguration) -> Self {
        init_logging();
        let coordinator = MountCoordinator::new(MemoryViewHost::new(), &config);
        Self {
            tree: ComponentTree::with_config(config),
            coordinator,
        }
    }

    /// Sets `root`, resolves inline and mounts. Render failures do not fail
    /// the call; they are reported in [`CommitReport::resolution_failures`].
    pub fn render(&mut self, root: impl Into<ComponentRef>) -> Result<CommitReport, LithoError> {
        match self.tree.set_root_sync(root) {
            Ok(_) | Err(LithoError::Resolution(_)) => {}
            Err(err) => return Err(err),
        }
        self.mount()?.ok_or(LithoError::NoRoot)
    }

    pub fn mount(&mut self) -> Result<Option<CommitReport>, LithoError> {
        self.tree.mount(&mut self.coordinator)
    }

    pub fn host(&self) -> &MemoryViewHost {
        self.coordinator.host()
    }

    pub fn host_mut(&mut self) -> &mut MemoryViewHost {
        self.coordinator.host_mut()
    }

    pub fn texts(&self) -> Vec<String> {
        self.host().texts()
    }
}

impl Default for TreeHarness {
    fn default() -> Self {
        Self::new()
    }
}
