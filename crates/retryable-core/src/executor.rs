//! Callback executors: where callback events run.
//!
//! Without an executor, callbacks run inline on the thread that observed the
//! completion (a transport worker). With one, every event is handed to
//! [`CallbackExecutor::execute`], and cancellation is checked again right
//! before the callback runs.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;

/// A unit of callback work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs callback tasks. Shared read-only across many calls; calls never
/// shut it down.
pub trait CallbackExecutor: Send + Sync {
    fn execute(&self, task: Task);
}

/// Runs tasks in submission order on one named thread, like a UI event loop.
///
/// The thread exits once this handle is dropped and the queue drains.
#[derive(Debug)]
pub struct DedicatedThread {
    tx: mpsc::Sender<Task>,
    name: String,
}

impl DedicatedThread {
    pub fn spawn(name: impl Into<String>) -> std::io::Result<Self> {
        let name = name.into();
        let (tx, rx) = mpsc::channel::<Task>();
        let thread_name = name.clone();
        thread::Builder::new().name(name.clone()).spawn(move || {
            for task in rx {
                if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                    tracing::error!(executor = %thread_name, "callback panicked");
                }
            }
        })?;
        Ok(Self { tx, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl CallbackExecutor for DedicatedThread {
    fn execute(&self, task: Task) {
        // The receiver only goes away if the thread died; never lose an event.
        if let Err(mpsc::SendError(task)) = self.tx.send(task) {
            tracing::warn!(executor = %self.name, "executor thread gone; running callback inline");
            task();
        }
    }
}

/// Runs tasks on a tokio runtime's blocking pool, so callbacks may block.
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: tokio::runtime::Handle,
}

impl TokioExecutor {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Executor on the runtime of the calling context.
    pub fn current() -> Result<Self, tokio::runtime::TryCurrentError> {
        tokio::runtime::Handle::try_current().map(Self::new)
    }
}

impl CallbackExecutor for TokioExecutor {
    fn execute(&self, task: Task) {
        drop(self.handle.spawn_blocking(task));
    }
}
