// Workhorse Thread Pool
//
// A fixed-size worker pool over a growing queue of independent tasks,
// with automatic retry of transient failures, a supervisor loop for
// idle/heartbeat callbacks and a live textual status snapshot.

pub mod logging;
pub mod status_file;
pub mod thread;

// Re-export commonly used types
pub use status_file::StatusFile;
pub use thread::{PoolError, PoolSnapshot, PoolState, ThreadPool, ThreadPoolConfig};
pub use workhorse_api::{task_fn, CancellationToken, StatusProvider, Task, TaskContext, TaskError};
