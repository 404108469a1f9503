//! # Task Capability
//!
//! A [`Task`] is a self-contained unit of work. The pool never looks
//! inside one: it only calls [`Task::run`] and uses the task's `Display`
//! form as a label in logs and status rows.
//!
//! Shutdown is cooperative. Every run receives a [`TaskContext`] whose
//! cancellation token flips when the pool is stopping; long-running
//! tasks should poll [`TaskContext::is_cancelled`] and return early.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::TaskError;

/// A unit of work that can be executed by the pool.
///
/// Recoverable failures put the same task back on the queue, so `run`
/// takes `&self` and may be called more than once. Keep any per-attempt
/// state behind interior mutability.
pub trait Task: fmt::Display + Send + Sync {
    /// Execute the task once.
    fn run(&self, ctx: &TaskContext) -> Result<(), TaskError>;
}

impl<T: Task + ?Sized> Task for Arc<T> {
    fn run(&self, ctx: &TaskContext) -> Result<(), TaskError> {
        (**self).run(ctx)
    }
}

impl<T: Task + ?Sized> Task for Box<T> {
    fn run(&self, ctx: &TaskContext) -> Result<(), TaskError> {
        (**self).run(ctx)
    }
}

/// Shared flag used to ask running tasks to wind down.
///
/// Clones observe the same flag. Once cancelled it stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the flag for every clone of this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// What a running task can see about its execution.
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// Name of the thread executing the task
    worker: String,

    /// Pool-wide shutdown signal
    token: CancellationToken,
}

impl TaskContext {
    pub fn new(worker: impl Into<String>, token: CancellationToken) -> Self {
        Self {
            worker: worker.into(),
            token,
        }
    }

    /// Name of the worker (or supervisor) running the task.
    pub fn worker(&self) -> &str {
        &self.worker
    }

    /// True once the owning pool has begun stopping.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }
}

/// A [`Task`] built from a label and a closure.
///
/// Created with [`task_fn`].
pub struct FnTask<F> {
    label: String,
    f: F,
}

/// Wrap a closure as a [`Task`] with the given label.
///
/// # Examples
///
/// ```rust
/// use workhorse_api::{task_fn, Task, TaskContext, CancellationToken};
///
/// let hello = task_fn("hello", |ctx: &TaskContext| {
///     println!("hello from {}", ctx.worker());
///     Ok(())
/// });
/// hello.run(&TaskContext::new("main", CancellationToken::new())).unwrap();
/// ```
pub fn task_fn<F>(label: impl Into<String>, f: F) -> FnTask<F>
where
    F: Fn(&TaskContext) -> Result<(), TaskError> + Send + Sync,
{
    FnTask {
        label: label.into(),
        f,
    }
}

impl<F> Task for FnTask<F>
where
    F: Fn(&TaskContext) -> Result<(), TaskError> + Send + Sync,
{
    fn run(&self, ctx: &TaskContext) -> Result<(), TaskError> {
        (self.f)(ctx)
    }
}

impl<F> fmt::Display for FnTask<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl<F> fmt::Debug for FnTask<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTask").field("label", &self.label).finish()
    }
}
