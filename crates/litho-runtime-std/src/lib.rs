//! Standard runtime services backed by Rust's `std` library.
//!
//! [`ThreadScheduler`] resolves on a dedicated worker thread and queues main
//! thread work until the host calls [`ThreadScheduler::pump`] from the thread
//! that owns its views. [`StdRuntime`] bundles the scheduler with a
//! configuration and creates trees wired to it.

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

use litho_core::{
    ComponentTree, ComponentsConfiguration, LayoutSolver, Scheduler, StackLayoutSolver, Task,
};

const WORKER_NAME: &str = "litho-resolve";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

enum Message {
    Run(Task),
    Flush(Sender<()>),
}

type Waker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Scheduler with one background worker thread and a main-thread queue.
pub struct ThreadScheduler {
    sender: Mutex<Option<Sender<Message>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    main_queue: Mutex<VecDeque<Task>>,
    main_waker: RwLock<Option<Waker>>,
}

impl ThreadScheduler {
    pub fn new() -> io::Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let worker = thread::Builder::new()
            .name(WORKER_NAME.into())
            .spawn(move || worker_loop(receiver))?;
        Ok(Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            main_queue: Mutex::new(VecDeque::new()),
            main_waker: RwLock::new(None),
        })
    }

    /// Registers a waker invoked whenever main-thread work is queued, so an
    /// event loop can schedule a [`pump`](Self::pump).
    pub fn set_main_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self
            .main_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(waker));
    }

    pub fn clear_main_waker(&self) {
        *self
            .main_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Runs queued main-thread tasks, including ones queued while pumping.
    /// Returns how many ran.
    pub fn pump(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = lock(&self.main_queue).pop_front();
            let Some(task) = next else { break };
            task();
            ran += 1;
        }
        ran
    }

    pub fn pending_main(&self) -> usize {
        lock(&self.main_queue).len()
    }

    /// Blocks until every background task submitted before this call has
    /// finished.
    pub fn flush(&self) {
        let (ack, done) = mpsc::channel();
        if self.send(Message::Flush(ack)) {
            let _ = done.recv();
        }
    }

    fn send(&self, message: Message) -> bool {
        let sender = lock(&self.sender);
        match sender.as_ref().map(|sender| sender.send(message)) {
            Some(Ok(())) => true,
            _ => {
                log::error!("{WORKER_NAME} worker is gone; dropping background task");
                false
            }
        }
    }

    fn wake(&self) {
        let waker = self
            .main_waker
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

fn worker_loop(receiver: Receiver<Message>) {
    for message in receiver {
        match message {
            Message::Run(task) => task(),
            Message::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    log::debug!("{WORKER_NAME} worker stopped");
}

impl Scheduler for ThreadScheduler {
    fn run_on_background(&self, task: Task) {
        self.send(Message::Run(task));
    }

    fn run_on_main(&self, task: Task) {
        lock(&self.main_queue).push_back(task);
        self.wake();
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        lock(&self.sender).take();
        let Some(worker) = lock(&self.worker).take() else {
            return;
        };
        // The last reference can be released by a task on the worker itself.
        if worker.thread().id() == thread::current().id() {
            return;
        }
        if worker.join().is_err() {
            log::error!("{WORKER_NAME} worker panicked");
        }
    }
}

impl fmt::Debug for ThreadScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadScheduler")
            .field("pending_main", &self.pending_main())
            .field("running", &lock(&self.sender).is_some())
            .finish()
    }
}

/// Convenience container bundling the thread scheduler, a layout solver and
/// the configuration used for new trees.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<ThreadScheduler>,
    solver: Arc<dyn LayoutSolver>,
    config: ComponentsConfiguration,
}

impl StdRuntime {
    /// Starts the worker with configuration read from the environment.
    pub fn new() -> io::Result<Self> {
        Self::with_config(ComponentsConfiguration::from_env())
    }

    pub fn with_config(config: ComponentsConfiguration) -> io::Result<Self> {
        Ok(Self {
            scheduler: Arc::new(ThreadScheduler::new()?),
            solver: Arc::new(StackLayoutSolver),
            config,
        })
    }

    pub fn with_solver(mut self, solver: Arc<dyn LayoutSolver>) -> Self {
        self.solver = solver;
        self
    }

    pub fn config(&self) -> &ComponentsConfiguration {
        &self.config
    }

    pub fn scheduler(&self) -> Arc<ThreadScheduler> {
        Arc::clone(&self.scheduler)
    }

    /// A tree that resolves on the worker and publishes through the main
    /// queue of this runtime.
    pub fn create_tree(&self) -> ComponentTree {
        ComponentTree::new(
            self.config.clone(),
            self.scheduler.clone(),
            Arc::clone(&self.solver),
        )
    }

    pub fn pump(&self) -> usize {
        self.scheduler.pump()
    }

    /// Waits for in-flight passes, then runs the main-thread work they
    /// queued.
    pub fn settle(&self) -> usize {
        self.scheduler.flush();
        self.scheduler.pump()
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn background_tasks_run_on_the_worker() {
        let scheduler = ThreadScheduler::new().unwrap();
        let names = Arc::new(Mutex::new(Vec::new()));
        for _ in 0..3 {
            let names = Arc::clone(&names);
            scheduler.run_on_background(Box::new(move || {
                let name = thread::current().name().map(str::to_owned);
                names.lock().unwrap().push(name);
            }));
        }
        scheduler.flush();
        let names = names.lock().unwrap();
        assert_eq!(names.len(), 3);
        assert!(names.iter().all(|name| name.as_deref() == Some(WORKER_NAME)));
    }

    #[test]
    fn main_tasks_wait_for_pump_and_wake_the_host() {
        let scheduler = ThreadScheduler::new().unwrap();
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        scheduler.set_main_waker(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let ran = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let ran = Arc::clone(&ran);
            scheduler.run_on_main(Box::new(move || {
                ran.fetch_add(1, Ordering::SeqCst);
            }));
        }
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(wakes.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.pending_main(), 2);
        assert_eq!(scheduler.pump(), 2);
        assert_eq!(ran.load(Ordering::SeqCst), 2);
    }
}
