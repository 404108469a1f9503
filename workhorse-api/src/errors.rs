//! # Task Error Types
//!
//! A task reports failure in one of two ways, and the pool treats them
//! very differently:
//!
//! - [`TaskError::Unrecoverable`]: a defect in the task's own logic. The
//!   pool counts the error, remembers the message and drops the task.
//! - [`TaskError::Recoverable`]: an external or transient condition. The
//!   pool counts the error, remembers the message and puts the *same*
//!   task back at the tail of the queue. There is no retry limit and no
//!   backoff; a task that always fails recoverably is retried forever.
//!
//! A panic inside [`Task::run`](crate::Task::run) is handled like an
//! unrecoverable failure.
//!
//! ## Usage Example
//!
//! ```rust
//! use workhorse_api::TaskError;
//!
//! let err = TaskError::recoverable("connection reset");
//! assert!(err.is_recoverable());
//! assert_eq!(err.to_string(), "connection reset");
//! ```

use std::fmt;

use thiserror::Error;

/// Failure reported by a task.
///
/// `Display` yields the bare failure message. This is the text the pool
/// keeps as a worker's last error.
#[derive(Error, Debug)]
pub enum TaskError {
    /// The task is broken. It is discarded and never retried.
    #[error("{0}")]
    Unrecoverable(#[from] anyhow::Error),

    /// The task hit a transient condition. It is re-queued for another attempt.
    #[error("{0}")]
    Recoverable(anyhow::Error),
}

impl TaskError {
    /// Build an unrecoverable failure from a message.
    pub fn unrecoverable<M>(message: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self::Unrecoverable(anyhow::Error::msg(message))
    }

    /// Build a recoverable failure from a message.
    pub fn recoverable<M>(message: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self::Recoverable(anyhow::Error::msg(message))
    }

    /// Whether the pool should re-queue the task that produced this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable(_))
    }

    /// The underlying cause.
    pub fn cause(&self) -> &anyhow::Error {
        match self {
            Self::Unrecoverable(err) | Self::Recoverable(err) => err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_mark_on_anyhow_is_unrecoverable() {
        fn parse(input: &str) -> Result<u32, TaskError> {
            let value = input
                .parse::<u32>()
                .map_err(|e| anyhow::anyhow!("bad input {input:?}: {e}"))?;
            Ok(value)
        }

        let err = parse("seven").unwrap_err();
        assert!(!err.is_recoverable());
        assert!(err.to_string().starts_with("bad input \"seven\""));
    }

    #[test]
    fn test_cause_is_shared_by_both_kinds() {
        assert_eq!(TaskError::recoverable("a").cause().to_string(), "a");
        assert_eq!(TaskError::unrecoverable("b").cause().to_string(), "b");
    }
}
