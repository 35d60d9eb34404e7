use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use litho_core::{Scheduler, Task};

/// Queues tasks until the test drains them, so interleavings are explicit.
#[derive(Default)]
pub struct ManualScheduler {
    background: Mutex<VecDeque<Task>>,
    main: Mutex<VecDeque<Task>>,
}

fn lock(queue: &Mutex<VecDeque<Task>>) -> MutexGuard<'_, VecDeque<Task>> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_background(&self) -> usize {
        lock(&self.background).len()
    }

    pub fn pending_main(&self) -> usize {
        lock(&self.main).len()
    }

    /// Runs queued background tasks, including ones queued while draining.
    pub fn run_background(&self) -> usize {
        Self::drain(&self.background)
    }

    pub fn run_main(&self) -> usize {
        Self::drain(&self.main)
    }

    fn drain(queue: &Mutex<VecDeque<Task>>) -> usize {
        let mut ran = 0;
        loop {
            let next = lock(queue).pop_front();
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    fn run_on_background(&self, task: Task) {
        lock(&self.background).push_back(task);
    }

    fn run_on_main(&self, task: Task) {
        lock(&self.main).push_back(task);
    }
}
