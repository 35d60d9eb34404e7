//! Platform abstraction for scheduling resolution and commit work.
//!
//! Resolution is pure and may run on any thread. Mounting and effects must
//! run on the thread that owns the host views; the scheduler decides what
//! "main thread" means for a given host.

pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub trait Scheduler: Send + Sync {
    /// Run a resolution pass off the main thread.
    fn run_on_background(&self, task: Task);

    /// Run a task on the thread that owns the mounted views.
    fn run_on_main(&self, task: Task);
}

/// Runs every task inline on the calling thread.
///
/// Suitable for tests and for hosts that resolve synchronously.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    fn run_on_background(&self, task: Task) {
        task();
    }

    fn run_on_main(&self, task: Task) {
        task();
    }
}
