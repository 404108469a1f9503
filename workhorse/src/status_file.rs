//! # Status File
//!
//! Dumps a [`StatusProvider`]'s snapshot to a file on demand, so a long
//! run can be watched from another terminal with `watch -n 1 cat <file>`.
//!
//! Write failures are logged and never propagated: a broken status file
//! must not take the pool down.
//!
//! ## Usage Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use workhorse::{StatusFile, ThreadPool};
//!
//! let pool = Arc::new(ThreadPool::new(4));
//! let status = StatusFile::temp(pool.clone()).unwrap();
//!
//! // Refresh the file on every supervisor heartbeat. The task only holds
//! // a weak reference, so the pool can still be dropped.
//! pool.set_heartbeat_task_with_interval(status.as_task(), Duration::from_millis(500));
//! # status.dump();
//! # assert!(std::fs::read_to_string(status.path()).unwrap().contains("STOPPED"));
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use tracing::{debug, info};
use workhorse_api::{StatusProvider, Task, TaskContext, TaskError};

/// Writes status snapshots to a fixed file.
#[derive(Clone)]
pub struct StatusFile {
    path: PathBuf,
    provider: Arc<dyn StatusProvider>,
}

impl fmt::Debug for StatusFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusFile").field("path", &self.path).finish()
    }
}

impl StatusFile {
    /// Dump status into `path`, overwriting it on every [`dump`](Self::dump).
    pub fn new(path: impl Into<PathBuf>, provider: Arc<dyn StatusProvider>) -> Self {
        let path = path.into();
        info!(
            path = %path.display(),
            "Use the following command to watch the status file: watch -n 1 cat \"{}\"",
            path.display()
        );
        Self { path, provider }
    }

    /// Dump status into a fresh `tmp-*.status` file in the system temp
    /// directory. The file outlives the process.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn temp(provider: Arc<dyn StatusProvider>) -> io::Result<Self> {
        let path = tempfile::Builder::new()
            .prefix("tmp-")
            .suffix(".status")
            .tempfile()?
            .into_temp_path()
            .keep()?;
        Ok(Self::new(path, provider))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render the provider's status and overwrite the file with it.
    pub fn dump(&self) {
        write_status(&self.path, self.provider.as_ref());
    }

    /// A task that dumps the status, for use as a pool callback.
    ///
    /// The task holds the provider weakly. Once every strong handle to
    /// the provider is gone it does nothing.
    pub fn as_task(&self) -> DumpStatus {
        DumpStatus {
            path: self.path.clone(),
            provider: Arc::downgrade(&self.provider),
        }
    }
}

fn write_status(path: &Path, provider: &dyn StatusProvider) {
    if let Err(err) = fs::write(path, provider.render_status()) {
        crate::log_error!(err, component = "status_file", path = %path.display());
    }
}

/// Task form of [`StatusFile::dump`]. Never fails.
#[derive(Clone)]
pub struct DumpStatus {
    path: PathBuf,
    provider: Weak<dyn StatusProvider>,
}

impl fmt::Debug for DumpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DumpStatus").field("path", &self.path).finish()
    }
}

impl fmt::Display for DumpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dump-status({})", self.path.display())
    }
}

impl Task for DumpStatus {
    fn run(&self, _ctx: &TaskContext) -> Result<(), TaskError> {
        match self.provider.upgrade() {
            Some(provider) => write_status(&self.path, provider.as_ref()),
            None => debug!(path = %self.path.display(), "Status provider dropped, skipping dump"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_overwrites_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.status");
        fs::write(&path, "stale content that is much longer than the new one").unwrap();

        let provider: Arc<dyn StatusProvider> = Arc::new(|status: &mut String| status.push_str("fresh"));
        let file = StatusFile::new(&path, provider);
        file.dump();

        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh");
    }

    #[test]
    fn test_dump_to_missing_directory_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("pool.status");

        let provider: Arc<dyn StatusProvider> = Arc::new(|status: &mut String| status.push_str("x"));
        let file = StatusFile::new(&path, provider);
        file.dump();

        assert!(!path.exists());
    }

    #[test]
    fn test_temp_file_is_created_and_kept() {
        let provider: Arc<dyn StatusProvider> = Arc::new(|status: &mut String| status.push_str("x"));
        let file = StatusFile::temp(provider).unwrap();

        assert!(file.path().exists());
        assert!(file.path().extension().is_some_and(|ext| ext == "status"));
        let name = file.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("tmp-"));

        file.dump();
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "x");
        let _ = fs::remove_file(file.path());
    }

    #[test]
    fn test_task_form_dumps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.status");
        let provider: Arc<dyn StatusProvider> = Arc::new(|status: &mut String| status.push_str("beat"));
        let file = StatusFile::new(&path, provider);
        let task = file.as_task();

        let ctx = TaskContext::new("supervisor", workhorse_api::CancellationToken::new());
        task.run(&ctx).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "beat");
        assert!(task.to_string().starts_with("dump-status("));
    }

    #[test]
    fn test_task_form_does_not_keep_provider_alive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.status");
        let provider: Arc<dyn StatusProvider> = Arc::new(|status: &mut String| status.push_str("beat"));
        let task = StatusFile::new(&path, provider.clone()).as_task();

        let weak = Arc::downgrade(&provider);
        drop(provider);
        assert!(weak.upgrade().is_none());

        let ctx = TaskContext::new("supervisor", workhorse_api::CancellationToken::new());
        task.run(&ctx).unwrap();
        assert!(!path.exists());
    }
}
