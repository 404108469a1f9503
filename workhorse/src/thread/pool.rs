use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime};

use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use tracing::{debug, info, warn};
use workhorse_api::{CancellationToken, StatusProvider, Task};

use super::config::ThreadPoolConfig;
use super::error::PoolError;
use super::status::PoolSnapshot;
use super::supervisor;
use super::worker::{Worker, WorkerStats};

/// Lifecycle of a pool.
///
/// `Created -> Running -> Stopping -> Stopped`. There is no way back:
/// a stopped pool cannot be started again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolState {
    /// Constructed, workers not launched yet
    Created,

    /// Workers are pulling tasks from the queue
    Running,

    /// `stop` is waiting for the workers to exit
    Stopping,

    /// All workers have exited
    Stopped,
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PoolState::Created => "CREATED",
            PoolState::Running => "RUNNING",
            PoolState::Stopping => "STOPPING",
            PoolState::Stopped => "STOPPED",
        };
        f.write_str(label)
    }
}

/// Everything guarded by the coordinator lock.
pub(crate) struct PoolInner {
    /// Pending tasks, oldest first
    pub(crate) queue: VecDeque<Box<dyn Task>>,

    /// Workers currently parked on `work_available`
    pub(crate) waiting: usize,

    pub(crate) state: PoolState,
    started: Option<(Instant, SystemTime)>,
    stopped: Option<(Instant, SystemTime)>,

    /// Supervisor callbacks, read at every iteration of `join`
    pub(crate) idle_task: Option<Arc<dyn Task>>,
    pub(crate) heartbeat_task: Option<Arc<dyn Task>>,
    pub(crate) heartbeat_interval: Duration,
}

impl PoolInner {
    pub(crate) fn is_idle(&self, pool_size: usize) -> bool {
        self.queue.is_empty() && self.waiting == pool_size
    }

    pub(crate) fn run_time(&self) -> Duration {
        match (self.started, self.stopped) {
            (Some((started, _)), Some((stopped, _))) => stopped.duration_since(started),
            (Some((started, _)), None) => started.elapsed(),
            _ => Duration::ZERO,
        }
    }
}

/// State shared between the pool handle and its workers.
///
/// Workers receive an `Arc` to this, never to the `ThreadPool` itself.
pub(crate) struct PoolShared {
    /// Pool name from the config, carried by every worker span
    pub(crate) name: String,

    pub(crate) inner: Mutex<PoolInner>,

    /// Signalled once per pushed task and broadcast on shutdown
    pub(crate) work_available: Condvar,

    /// Per-worker counters, indexed by worker id. Never resized.
    pub(crate) workers: Vec<WorkerStats>,

    /// Flipped when the pool starts stopping
    pub(crate) token: CancellationToken,
}

impl PoolShared {
    /// Append a task to the tail of the queue and wake one parked worker.
    pub(crate) fn push(&self, task: Box<dyn Task>) {
        self.inner.lock().queue.push_back(task);
        self.work_available.notify_one();
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.inner.lock().is_idle(self.workers.len())
    }

    pub(crate) fn state(&self) -> PoolState {
        self.inner.lock().state
    }
}

/// A fixed set of worker threads draining one shared FIFO queue.
///
/// # Lifecycle
/// 1. Construct with a fixed number of workers
/// 2. [`push`](Self::push) tasks at any time, before or after starting
/// 3. [`start`](Self::start) launches the workers
/// 4. [`join`](Self::join) runs the supervisor loop on the calling thread
/// 5. [`stop`](Self::stop) cancels, wakes and joins every worker
///
/// # Failure handling
/// - Unrecoverable task failures (and panics) are logged, counted and dropped
/// - Recoverable task failures are logged, counted and re-queued at the tail,
///   with no retry limit
/// - Only lifecycle misuse is returned to the caller as [`PoolError`]
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use workhorse::thread::ThreadPool;
/// use workhorse_api::task_fn;
///
/// let pool = Arc::new(ThreadPool::new(2));
/// for i in 0..4 {
///     pool.push(task_fn(format!("job-{i}"), |_| Ok(())));
/// }
/// pool.start().unwrap();
///
/// let stopper = Arc::downgrade(&pool);
/// pool.set_heartbeat_interval(Duration::from_millis(10));
/// pool.join_on_idle(task_fn("stop-when-idle", move |_| {
///     if let Some(pool) = stopper.upgrade() {
///         let _ = pool.stop();
///     }
///     Ok(())
/// }));
///
/// assert_eq!(pool.snapshot().tasks_completed(), 4);
/// ```
pub struct ThreadPool {
    shared: Arc<PoolShared>,
    config: ThreadPoolConfig,

    /// Join handles of the running workers, taken by `stop`
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("ThreadPool")
            .field("name", &self.config.name)
            .field("pool_size", &self.shared.workers.len())
            .field("state", &inner.state)
            .field("queued", &inner.queue.len())
            .field("waiting", &inner.waiting)
            .finish()
    }
}

impl ThreadPool {
    /// Create a pool with `pool_size` workers and default settings.
    ///
    /// # Panics
    /// Panics if `pool_size` is zero.
    pub fn new(pool_size: usize) -> Self {
        Self::with_config(ThreadPoolConfig::with_pool_size(pool_size))
    }

    /// Create a pool from an explicit configuration.
    ///
    /// # Panics
    /// Panics if `config.pool_size` is zero.
    pub fn with_config(config: ThreadPoolConfig) -> Self {
        assert!(config.pool_size > 0, "thread pool needs at least one worker");

        let workers = (0..config.pool_size)
            .map(|index| WorkerStats::new(config.worker_name(index)))
            .collect();

        let inner = PoolInner {
            queue: VecDeque::new(),
            waiting: 0,
            state: PoolState::Created,
            started: None,
            stopped: None,
            idle_task: None,
            heartbeat_task: None,
            heartbeat_interval: config.heartbeat_interval,
        };

        Self {
            shared: Arc::new(PoolShared {
                name: config.name.clone(),
                inner: Mutex::new(inner),
                work_available: Condvar::new(),
                workers,
                token: CancellationToken::new(),
            }),
            config,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Queue a task for execution.
    ///
    /// Never blocks beyond the coordinator lock. Tasks pushed before
    /// [`start`](Self::start) wait in the queue until workers exist.
    pub fn push<T: Task + 'static>(&self, task: T) {
        debug!(task = %task, "Task queued");
        self.shared.push(Box::new(task));
    }

    /// Launch every worker thread.
    ///
    /// # Errors
    /// - [`PoolError::InvalidState`] if the pool was started before
    /// - [`PoolError::ThreadSpawn`] if the OS refuses a thread; any
    ///   workers already launched are stopped again
    pub fn start(&self) -> Result<(), PoolError> {
        {
            let mut inner = self.shared.inner.lock();
            if inner.state != PoolState::Created {
                return Err(PoolError::InvalidState {
                    operation: "start",
                    state: inner.state,
                });
            }
            inner.state = PoolState::Running;
            inner.started = Some((Instant::now(), SystemTime::now()));
        }

        let mut handles = self.handles.lock();
        for index in 0..self.shared.workers.len() {
            let worker = Worker::new(index, Arc::clone(&self.shared));
            match worker.spawn() {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    drop(handles);
                    self.shared.inner.lock().state = PoolState::Stopping;
                    self.shutdown_workers();
                    self.mark_stopped();
                    return Err(err);
                }
            }
        }

        crate::log_pool!(self.config.name.as_str(), "started", pool_size = self.shared.workers.len());
        Ok(())
    }

    /// Stop the pool and wait for every worker to exit.
    ///
    /// Only parked workers are interrupted. Workers keep taking queued
    /// tasks until the queue is empty, so `stop` returns once the backlog
    /// is drained. Running tasks see the cancellation through
    /// [`TaskContext::is_cancelled`](workhorse_api::TaskContext::is_cancelled)
    /// and may return early.
    ///
    /// # Errors
    /// [`PoolError::InvalidState`] unless the pool is running.
    pub fn stop(&self) -> Result<(), PoolError> {
        {
            let mut inner = self.shared.inner.lock();
            if inner.state != PoolState::Running {
                return Err(PoolError::InvalidState {
                    operation: "stop",
                    state: inner.state,
                });
            }
            inner.state = PoolState::Stopping;

            let queued = inner.queue.len();
            if queued > 0 {
                info!(pool = %self.config.name, queued, "Draining {} queued tasks before stopping", queued);
            }
        }

        self.shutdown_workers();
        self.mark_stopped();

        crate::log_pool!(self.config.name.as_str(), "stopped");
        Ok(())
    }

    fn shutdown_workers(&self) {
        {
            // Cancel under the lock so no worker can check the token and
            // then park after the broadcast below.
            let _inner = self.shared.inner.lock();
            self.shared.token.cancel();
        }
        self.shared.work_available.notify_all();

        let handles = std::mem::take(&mut *self.handles.lock());
        let current = thread::current().id();
        for handle in handles {
            let name = handle.thread().name().unwrap_or("<unnamed>").to_string();
            if handle.thread().id() == current {
                warn!(worker = %name, "Stop called from a worker thread, skipping its join");
                continue;
            }
            if handle.join().is_err() {
                warn!(worker = %name, "Worker thread could not be joined, skipping");
            }
        }
    }

    fn mark_stopped(&self) {
        let mut inner = self.shared.inner.lock();
        inner.state = PoolState::Stopped;
        inner.stopped = Some((Instant::now(), SystemTime::now()));
    }

    /// Replace the callback run by `join` whenever the pool is idle.
    pub fn set_idle_task<T: Task + 'static>(&self, task: T) {
        self.shared.inner.lock().idle_task = Some(Arc::new(task));
    }

    /// Replace the callback run by `join` on every iteration.
    pub fn set_heartbeat_task<T: Task + 'static>(&self, task: T) {
        self.shared.inner.lock().heartbeat_task = Some(Arc::new(task));
    }

    /// Replace the heartbeat callback and the supervisor polling interval.
    pub fn set_heartbeat_task_with_interval<T: Task + 'static>(&self, task: T, interval: Duration) {
        let mut inner = self.shared.inner.lock();
        inner.heartbeat_task = Some(Arc::new(task));
        inner.heartbeat_interval = interval;
    }

    pub fn set_heartbeat_interval(&self, interval: Duration) {
        self.shared.inner.lock().heartbeat_interval = interval;
    }

    /// Remove both supervisor callbacks.
    pub fn clear_callbacks(&self) {
        let mut inner = self.shared.inner.lock();
        inner.idle_task = None;
        inner.heartbeat_task = None;
    }

    /// Run the supervisor loop on the calling thread until the pool is stopped.
    ///
    /// Returns immediately if the pool was never started. Something has
    /// to call [`stop`](Self::stop) for this to return, typically the
    /// idle callback or another thread.
    pub fn join(&self) {
        supervisor::supervise(&self.shared);
    }

    /// Set the idle callback, then [`join`](Self::join).
    pub fn join_on_idle<I: Task + 'static>(&self, idle_task: I) {
        self.set_idle_task(idle_task);
        self.join();
    }

    /// Set the idle and heartbeat callbacks, then [`join`](Self::join).
    pub fn join_with<I, H>(&self, idle_task: I, heartbeat_task: H)
    where
        I: Task + 'static,
        H: Task + 'static,
    {
        self.set_idle_task(idle_task);
        self.set_heartbeat_task(heartbeat_task);
        self.join();
    }

    /// Set both callbacks and the polling interval, then [`join`](Self::join).
    pub fn join_with_interval<I, H>(&self, idle_task: I, heartbeat_task: H, interval: Duration)
    where
        I: Task + 'static,
        H: Task + 'static,
    {
        self.set_idle_task(idle_task);
        self.set_heartbeat_task_with_interval(heartbeat_task, interval);
        self.join();
    }

    /// Set the heartbeat callback and polling interval, then [`join`](Self::join).
    pub fn join_with_heartbeat<H: Task + 'static>(&self, heartbeat_task: H, interval: Duration) {
        self.set_heartbeat_task_with_interval(heartbeat_task, interval);
        self.join();
    }

    /// True when the queue is empty and every worker is parked waiting for work.
    pub fn is_idle(&self) -> bool {
        self.shared.is_idle()
    }

    /// Number of tasks waiting in the queue.
    pub fn tasks_in_queue(&self) -> usize {
        self.shared.inner.lock().queue.len()
    }

    pub fn state(&self) -> PoolState {
        self.shared.state()
    }

    /// Wall-clock time of the successful `start`, if any.
    pub fn started_at(&self) -> Option<SystemTime> {
        self.shared.inner.lock().started.map(|(_, at)| at)
    }

    /// Wall-clock time at which `stop` finished, if it has.
    pub fn stopped_at(&self) -> Option<SystemTime> {
        self.shared.inner.lock().stopped.map(|(_, at)| at)
    }

    pub fn pool_size(&self) -> usize {
        self.shared.workers.len()
    }

    pub fn config(&self) -> &ThreadPoolConfig {
        &self.config
    }

    /// Consistent point-in-time view of the pool.
    ///
    /// Pool-wide fields are read under the coordinator lock; per-worker
    /// counters are read right after and may be a moment newer.
    pub fn snapshot(&self) -> PoolSnapshot {
        let pool_size = self.shared.workers.len();
        let (state, run_time, waiting, queued) = {
            let inner = self.shared.inner.lock();
            (inner.state, inner.run_time(), inner.waiting, inner.queue.len())
        };

        PoolSnapshot {
            state,
            run_time_secs: run_time.as_secs_f64(),
            busy: pool_size.saturating_sub(waiting),
            pool_size,
            queued,
            workers: self.shared.workers.iter().map(WorkerStats::snapshot).collect(),
        }
    }

    /// Render the status table described by [`PoolSnapshot`]'s `Display`.
    pub fn status(&self) -> String {
        self.snapshot().to_string()
    }
}

impl StatusProvider for ThreadPool {
    fn update_status(&self, status: &mut String) {
        status.push_str(&self.status());
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        if self.state() == PoolState::Running {
            debug!("Thread pool dropped while running, stopping workers");
            let _ = self.stop();
        }
    }
}
