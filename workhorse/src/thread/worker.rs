//! # Worker Thread
//!
//! One worker is one OS thread bound to the pool for its whole life.
//!
//! ## Core Algorithm
//! 1. Lock the coordinator and pop the queue head; park on the condvar
//!    while the queue is empty, counting itself as waiting
//! 2. Exit once the queue is empty and the pool's cancellation token is set
//! 3. Run the task outside the lock, catching panics
//! 4. Record the outcome: success, dropped failure, or re-queued failure
//!
//! Workers only hold an `Arc<PoolShared>` and their own index, so there
//! is no reference cycle between the pool and its threads.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use tracing::{debug, error, warn};
use workhorse_api::{Task, TaskContext, TaskError};

use super::error::PoolError;
use super::pool::PoolShared;
use super::status::WorkerSnapshot;

/// Counters owned by one worker and read by status rendering.
///
/// Only the owning worker writes. Readers may see a value a moment
/// stale, never a torn one.
#[derive(Debug)]
pub(crate) struct WorkerStats {
    name: String,
    tasks_completed: AtomicU64,
    error_count: AtomicU64,
    last_error: Mutex<Option<String>>,
    current_task: Mutex<Option<String>>,
}

impl WorkerStats {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            tasks_completed: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            last_error: Mutex::new(None),
            current_task: Mutex::new(None),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    fn begin(&self, label: String) {
        *self.current_task.lock() = Some(label);
    }

    fn finish(&self) {
        *self.current_task.lock() = None;
    }

    fn record_success(&self) {
        self.tasks_completed.fetch_add(1, Ordering::SeqCst);
    }

    fn record_error(&self, message: String) {
        self.error_count.fetch_add(1, Ordering::SeqCst);
        *self.last_error.lock() = Some(message);
    }

    pub(crate) fn snapshot(&self) -> WorkerSnapshot {
        WorkerSnapshot {
            name: self.name.clone(),
            tasks_completed: self.tasks_completed.load(Ordering::SeqCst),
            error_count: self.error_count.load(Ordering::SeqCst),
            current_task: self.current_task.lock().clone(),
            last_error: self.last_error.lock().clone(),
        }
    }
}

/// How one execution of a task ended.
#[derive(Debug)]
enum Outcome {
    Completed,
    Failed(String),
    Retry(String),
}

impl Outcome {
    fn from_result(result: std::thread::Result<Result<(), TaskError>>) -> Self {
        match result {
            Ok(Ok(())) => Outcome::Completed,
            Ok(Err(err @ TaskError::Recoverable(_))) => Outcome::Retry(err.to_string()),
            Ok(Err(err)) => Outcome::Failed(err.to_string()),
            Err(payload) => Outcome::Failed(panic_message(payload.as_ref())),
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

pub(crate) struct Worker {
    id: usize,
    shared: Arc<PoolShared>,
}

impl Worker {
    pub(crate) fn new(id: usize, shared: Arc<PoolShared>) -> Self {
        Self { id, shared }
    }

    fn stats(&self) -> &WorkerStats {
        &self.shared.workers[self.id]
    }

    /// Launch the worker loop on a named OS thread.
    pub(crate) fn spawn(self) -> Result<JoinHandle<()>, PoolError> {
        let name = self.stats().name().to_string();
        std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || self.run_loop())
            .map_err(|e| PoolError::ThreadSpawn {
                name,
                reason: e.to_string(),
            })
    }

    fn run_loop(&self) {
        let ctx = TaskContext::new(self.stats().name(), self.shared.token.clone());
        let _span = crate::pool_span!(self.shared.name.as_str(), worker = ctx.worker()).entered();
        debug!(worker = ctx.worker(), "Worker started");

        while let Some(task) = self.next_task() {
            self.execute(task, &ctx);
        }

        debug!(worker = ctx.worker(), "Worker exiting");
    }

    /// Block until a task is available. `None` means the pool is stopping
    /// and the queue has been drained.
    fn next_task(&self) -> Option<Box<dyn Task>> {
        let mut inner = self.shared.inner.lock();
        loop {
            if let Some(task) = inner.queue.pop_front() {
                return Some(task);
            }
            // Only a wait can be interrupted, never a take.
            if self.shared.token.is_cancelled() {
                return None;
            }

            inner.waiting += 1;
            self.shared.work_available.wait(&mut inner);
            inner.waiting -= 1;
        }
    }

    fn execute(&self, task: Box<dyn Task>, ctx: &TaskContext) {
        let stats = self.stats();
        let label = task.to_string();
        stats.begin(label.clone());

        let result = panic::catch_unwind(AssertUnwindSafe(|| task.run(ctx)));

        match Outcome::from_result(result) {
            Outcome::Completed => {
                crate::log_task!(label.as_str(), "completed", worker = stats.name());
                stats.record_success();
            }
            Outcome::Failed(message) => {
                error!(worker = stats.name(), task = %label, "ERROR {} {}", label, message);
                stats.record_error(message);
            }
            Outcome::Retry(message) => {
                warn!(worker = stats.name(), task = %label, "ERROR-WILL-RETRY {} {}", label, message);
                stats.record_error(message);
                self.shared.push(task);
            }
        }

        stats.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_classification() {
        assert!(matches!(Outcome::from_result(Ok(Ok(()))), Outcome::Completed));
        assert!(matches!(
            Outcome::from_result(Ok(Err(TaskError::recoverable("busy")))),
            Outcome::Retry(m) if m == "busy"
        ));
        assert!(matches!(
            Outcome::from_result(Ok(Err(TaskError::unrecoverable("bug")))),
            Outcome::Failed(m) if m == "bug"
        ));
    }

    #[test]
    fn test_panic_payload_becomes_failure() {
        let result = panic::catch_unwind(|| -> Result<(), TaskError> { panic!("index out of range") });
        match Outcome::from_result(result) {
            Outcome::Failed(message) => assert_eq!(message, "panicked: index out of range"),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_stats_snapshot_tracks_counters() {
        let stats = WorkerStats::new("worker-9".to_string());
        stats.begin("job".to_string());
        assert_eq!(stats.snapshot().current_task.as_deref(), Some("job"));

        stats.record_success();
        stats.record_error("boom".to_string());
        stats.finish();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.name, "worker-9");
        assert_eq!(snapshot.tasks_completed, 1);
        assert_eq!(snapshot.error_count, 1);
        assert_eq!(snapshot.last_error.as_deref(), Some("boom"));
        assert!(snapshot.current_task.is_none());
    }
}
