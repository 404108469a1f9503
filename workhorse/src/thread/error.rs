use thiserror::Error;

use super::pool::PoolState;

/// Errors surfaced to callers of the pool.
///
/// Task and callback failures never show up here: they are logged and
/// counted per worker. Only lifecycle misuse reaches the caller.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Cannot {operation} pool in state {state}")]
    InvalidState {
        operation: &'static str,
        state: PoolState,
    },
    #[error("Failed to spawn worker thread {name}: {reason}")]
    ThreadSpawn { name: String, reason: String },
}
