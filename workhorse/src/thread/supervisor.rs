//! Supervisor loop run by `ThreadPool::join` on the caller's thread.
//!
//! Each iteration sleeps for the heartbeat interval, runs the idle
//! callback if the pool is idle, runs the heartbeat callback, then
//! returns once the pool has stopped. Callback failures and panics are
//! logged and swallowed so they can never take the loop down.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use tracing::{debug, error};
use workhorse_api::{Task, TaskContext};

use super::pool::{PoolShared, PoolState};
use super::worker::panic_message;

pub(crate) const SUPERVISOR_NAME: &str = "supervisor";

pub(crate) fn supervise(shared: &PoolShared) {
    let ctx = TaskContext::new(SUPERVISOR_NAME, shared.token.clone());

    // A pool that never started has nothing to wait for.
    if !matches!(shared.state(), PoolState::Running | PoolState::Stopping) {
        debug!("join called on a pool that is not running");
        return;
    }

    loop {
        let interval = shared.inner.lock().heartbeat_interval;
        thread::sleep(interval);

        let (idle, idle_task, heartbeat_task) = {
            let inner = shared.inner.lock();
            (
                inner.is_idle(shared.workers.len()),
                inner.idle_task.clone(),
                inner.heartbeat_task.clone(),
            )
        };

        if idle {
            if let Some(task) = idle_task {
                run_callback("idle", &task, &ctx);
            }
        }

        if let Some(task) = heartbeat_task {
            run_callback("heartbeat", &task, &ctx);
        }

        if shared.state() == PoolState::Stopped {
            debug!("Pool stopped, supervisor exiting");
            return;
        }
    }
}

fn run_callback(kind: &str, task: &Arc<dyn Task>, ctx: &TaskContext) {
    match panic::catch_unwind(AssertUnwindSafe(|| task.run(ctx))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            error!(callback = %task, kind, "Error while running {} task {}: {}", kind, task, err);
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(callback = %task, kind, "Error while running {} task {}: {}", kind, task, message);
        }
    }
}
