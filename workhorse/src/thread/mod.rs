//! # Thread Pool Module
//!
//! A fixed set of OS worker threads draining one shared FIFO queue of
//! [`Task`](workhorse_api::Task)s.
//!
//! ## Key Concepts
//! - Pool: owns the queue, the workers and the lifecycle state machine
//! - Worker: one thread that blocks for work, runs it and records the outcome
//! - Supervisor: the caller's own thread inside `join`, running idle and
//!   heartbeat callbacks until the pool stops
//! - Snapshot: a consistent view of pool health, rendered as a text table
//!
//! ## Concurrency
//! One `parking_lot::Mutex` guards the queue, the waiting count, the
//! lifecycle timestamps and the callbacks. A single condvar is signalled
//! once per pushed task and broadcast on shutdown. Per-worker counters
//! live outside that lock and are read without blocking workers.

pub mod config;
pub mod error;
pub mod pool;
pub mod status;
mod supervisor;
mod worker;

pub use config::{
    ThreadPoolConfig, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_POOL_NAME, DEFAULT_THREAD_NAME_PREFIX,
};
pub use error::PoolError;
pub use pool::{PoolState, ThreadPool};
pub use status::{PoolSnapshot, WorkerSnapshot};
