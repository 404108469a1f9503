//! Point-in-time pool status and its fixed-width text rendering.
//!
//! ```text
//! Total run time: 12.3 seconds.     Status: RUNNING   Activity: 3/4   Queue: 17 tasks
//! Thread         | Tasks |  Errs | Current              | Last Error
//! ====================================================================================================
//! worker-0       |    41 |     1 | fetch-page-93        | upstream returned 503
//! ...
//! ====================================================================================================
//! ```

use std::fmt;

use serde::Serialize;

use super::pool::PoolState;

const SEPARATOR_WIDTH: usize = 100;
const CURRENT_TASK_WIDTH: usize = 20;

/// Snapshot of the whole pool, see [`ThreadPool::snapshot`](super::ThreadPool::snapshot).
#[derive(Debug, Clone, Serialize)]
pub struct PoolSnapshot {
    pub state: PoolState,

    /// Seconds since `start`, frozen at `stop`
    pub run_time_secs: f64,

    /// Workers not parked waiting for work
    pub busy: usize,
    pub pool_size: usize,

    /// Tasks waiting in the queue
    pub queued: usize,
    pub workers: Vec<WorkerSnapshot>,
}

/// One row of the status table.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerSnapshot {
    pub name: String,
    pub tasks_completed: u64,
    pub error_count: u64,
    pub current_task: Option<String>,
    pub last_error: Option<String>,
}

impl PoolSnapshot {
    /// Completed tasks summed over every worker.
    pub fn tasks_completed(&self) -> u64 {
        self.workers.iter().map(|w| w.tasks_completed).sum()
    }

    /// Task errors summed over every worker.
    pub fn error_count(&self) -> u64 {
        self.workers.iter().map(|w| w.error_count).sum()
    }

    fn is_active(&self) -> bool {
        matches!(self.state, PoolState::Running | PoolState::Stopping)
    }
}

impl fmt::Display for PoolSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Total run time: {:.1} seconds.     Status: ", self.run_time_secs)?;
        if self.is_active() {
            writeln!(
                f,
                "RUNNING   Activity: {}/{}   Queue: {} tasks",
                self.busy, self.pool_size, self.queued
            )?;
        } else {
            writeln!(f, "STOPPED")?;
        }

        writeln!(
            f,
            "{:<14} | {:>5} | {:>5} | {:<20} | {}",
            "Thread", "Tasks", "Errs", "Current", "Last Error"
        )?;
        writeln!(f, "{}", "=".repeat(SEPARATOR_WIDTH))?;
        for worker in &self.workers {
            writeln!(f, "{worker}")?;
        }
        writeln!(f, "{}", "=".repeat(SEPARATOR_WIDTH))
    }
}

impl fmt::Display for WorkerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = self.current_task.as_deref().unwrap_or("-");
        write!(
            f,
            "{:<14} | {:>5} | {:>5} | {:<20} | {}",
            self.name,
            self.tasks_completed,
            self.error_count,
            truncate(current, CURRENT_TASK_WIDTH),
            self.last_error.as_deref().unwrap_or("-"),
        )
    }
}

/// First `max_chars` characters of `s`.
fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((index, _)) => &s[..index],
        None => s,
    }
}
