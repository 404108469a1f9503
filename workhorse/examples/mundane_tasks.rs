use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::Rng;
use workhorse::logging;
use workhorse::thread::{ThreadPool, ThreadPoolConfig};
use workhorse::StatusFile;
use workhorse_api::{task_fn, TaskError};

fn main() -> anyhow::Result<()> {
    logging::init_default();

    let pool = Arc::new(ThreadPool::with_config(ThreadPoolConfig {
        name: "mundane".to_string(),
        heartbeat_interval: Duration::from_millis(250),
        ..ThreadPoolConfig::with_pool_size(16)
    }));
    let status = StatusFile::temp(pool.clone())?;

    // Tasks that sleep for a while; every 97th hits a flaky upstream once.
    for i in 0..500u64 {
        let flaked = AtomicBool::new(false);
        pool.push(task_fn(format!("Mundane-{i}"), move |ctx| {
            if ctx.is_cancelled() {
                return Ok(());
            }
            let millis = rand::thread_rng().gen_range(10..100);
            thread::sleep(Duration::from_millis(millis));
            if i % 97 == 0 && !flaked.swap(true, Ordering::SeqCst) {
                return Err(TaskError::recoverable("upstream busy"));
            }
            Ok(())
        }));
    }

    pool.start()?;
    status.dump();

    let stopper = Arc::downgrade(&pool);
    pool.join_with(
        task_fn("stop-when-idle", move |_| {
            if let Some(pool) = stopper.upgrade() {
                pool.stop().map_err(anyhow::Error::from)?;
            }
            Ok(())
        }),
        status.as_task(),
    );

    print!("{}", pool.status());
    Ok(())
}
