//! Executor that holds callback tasks until the test runs them, opening a
//! window between "outcome observed" and "callback invoked".

use std::collections::VecDeque;
use std::sync::Mutex;

use retryable_core::{CallbackExecutor, Task};

#[derive(Default)]
pub struct QueuedExecutor {
    tasks: Mutex<VecDeque<Task>>,
}

impl QueuedExecutor {
    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    /// Run queued tasks (including ones queued while running). Returns how many ran.
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        loop {
            let Some(task) = self.tasks.lock().unwrap().pop_front() else {
                return ran;
            };
            task();
            ran += 1;
        }
    }
}

impl CallbackExecutor for QueuedExecutor {
    fn execute(&self, task: Task) {
        self.tasks.lock().unwrap().push_back(task);
    }
}
