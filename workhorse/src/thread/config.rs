use std::time::Duration;

/// Default interval between two supervisor iterations in `join`.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(1000);

/// Default pool name used in log events.
pub const DEFAULT_POOL_NAME: &str = "workhorse";

/// Default prefix for worker thread names.
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "worker-";

/// Configuration for a [`ThreadPool`](super::ThreadPool).
#[derive(Clone, Debug)]
pub struct ThreadPoolConfig {
    /// Name used in log events
    pub name: String,

    /// Number of worker threads. Fixed for the lifetime of the pool.
    pub pool_size: usize,

    /// How long the supervisor sleeps between polls of the pool.
    /// Can be changed later through the heartbeat setters.
    pub heartbeat_interval: Duration,

    /// Worker threads are named `<prefix><index>`.
    pub thread_name_prefix: String,
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_POOL_NAME.to_string(),
            pool_size: num_cpus::get(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
        }
    }
}

impl ThreadPoolConfig {
    /// Default configuration with an explicit number of workers.
    pub fn with_pool_size(pool_size: usize) -> Self {
        Self {
            pool_size,
            ..Default::default()
        }
    }

    pub(crate) fn worker_name(&self, index: usize) -> String {
        format!("{}{}", self.thread_name_prefix, index)
    }
}
