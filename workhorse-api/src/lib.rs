//! # Workhorse Task API
//!
//! Contracts shared between the workhorse thread pool and the code that
//! feeds it work.
//!
//! ## Core Components
//!
//! - **Task**: one schedulable unit of work, labelled by its `Display` form
//! - **TaskContext**: what a running task can see about the thread executing it
//! - **TaskError**: the two-way failure split that drives retries
//! - **StatusProvider**: anything that can render a textual status snapshot
//!
//! ## Usage Example
//!
//! ```rust
//! use workhorse_api::{task_fn, Task, TaskContext, TaskError, CancellationToken};
//!
//! let fetch = task_fn("fetch-page-7", |_ctx: &TaskContext| {
//!     // a transient failure asks the pool to try again later
//!     Err(TaskError::recoverable("upstream returned 503"))
//! });
//!
//! let ctx = TaskContext::new("worker-0", CancellationToken::new());
//! assert!(fetch.run(&ctx).unwrap_err().is_recoverable());
//! assert_eq!(fetch.to_string(), "fetch-page-7");
//! ```
//!
//! ## Module Organization
//!
//! - [`task`]: the task capability, execution context and closure adapter
//! - [`errors`]: task failure classification
//! - [`status`]: status rendering capability

pub mod errors;
pub mod status;
pub mod task;

pub use errors::TaskError;
pub use status::StatusProvider;
pub use task::{task_fn, CancellationToken, FnTask, Task, TaskContext};
