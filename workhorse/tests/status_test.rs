// Integration tests for status snapshots taken while the pool is busy

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use workhorse::thread::{PoolState, ThreadPool, ThreadPoolConfig};
use workhorse::{StatusFile, StatusProvider};
use workhorse_api::{task_fn, TaskError};

/// Pull `Activity: <busy>/<total>` and `Queue: <n>` out of a running header line.
fn parse_header(line: &str) -> Option<(usize, usize, usize)> {
    let activity = line.split("Activity: ").nth(1)?.split_whitespace().next()?;
    let (busy, total) = activity.split_once('/')?;
    let queue = line.split("Queue: ").nth(1)?.split_whitespace().next()?;
    Some((busy.parse().ok()?, total.parse().ok()?, queue.parse().ok()?))
}

#[test]
fn test_status_is_consistent_under_load() {
    let pool = Arc::new(ThreadPool::with_config(ThreadPoolConfig {
        heartbeat_interval: Duration::from_millis(10),
        ..ThreadPoolConfig::with_pool_size(4)
    }));
    pool.start().unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let reader = {
        let pool = pool.clone();
        let done = done.clone();
        thread::spawn(move || {
            let mut samples = 0;
            while !done.load(Ordering::SeqCst) {
                let status = pool.status();
                let header = status.lines().next().unwrap().to_string();
                match parse_header(&header) {
                    Some((busy, total, _queued)) => {
                        assert!(busy <= total);
                        assert_eq!(total, 4);
                    }
                    None => assert!(header.ends_with("Status: STOPPED"), "unexpected header: {header}"),
                }
                assert_eq!(status.lines().count(), 4 + 4);
                samples += 1;
            }
            samples
        })
    };

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let pool = pool.clone();
            thread::spawn(move || {
                for i in 0..250 {
                    pool.push(task_fn(format!("p{p}-task-{i}"), move |_| {
                        if i % 50 == 0 {
                            return Err(TaskError::unrecoverable("sampled failure"));
                        }
                        Ok(())
                    }));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    let stopper = Arc::downgrade(&pool);
    pool.join_on_idle(task_fn("stop-when-idle", move |_| {
        if let Some(pool) = stopper.upgrade() {
            let _ = pool.stop();
        }
        Ok(())
    }));
    done.store(true, Ordering::SeqCst);
    assert!(reader.join().unwrap() > 0);

    let snapshot = pool.snapshot();
    assert_eq!(snapshot.state, PoolState::Stopped);
    assert_eq!(snapshot.tasks_completed() + snapshot.error_count(), 1000);
    assert_eq!(snapshot.error_count(), 20);
    assert_eq!(snapshot.queued, 0);
}

#[test]
fn test_snapshot_serializes_to_json() {
    let pool = ThreadPool::new(2);
    pool.push(task_fn("pending", |_| Ok(())));

    let json = serde_json::to_value(pool.snapshot()).unwrap();
    assert_eq!(json["state"], "CREATED");
    assert_eq!(json["pool_size"], 2);
    assert_eq!(json["queued"], 1);
    assert_eq!(json["workers"][1]["name"], "worker-1");
    assert!(json["workers"][0]["last_error"].is_null());
}

#[test]
fn test_pool_renders_through_status_provider() {
    let pool = ThreadPool::new(2);
    let mut status = String::from("prefix\n");
    pool.update_status(&mut status);

    assert!(status.starts_with("prefix\nTotal run time: 0.0 seconds.     Status: STOPPED\n"));
    assert!(status.contains("worker-0       |     0 |     0 | -                    | -"));
}

#[test]
fn test_status_file_dumps_running_pool() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pool.status");
    let pool = Arc::new(ThreadPool::new(2));
    let file = StatusFile::new(&path, pool.clone());

    pool.start().unwrap();
    file.dump();
    let running = std::fs::read_to_string(&path).unwrap();
    assert!(running.contains("Status: RUNNING   Activity: "));

    pool.stop().unwrap();
    file.dump();
    let stopped = std::fs::read_to_string(&path).unwrap();
    assert!(stopped.lines().next().unwrap().ends_with("Status: STOPPED"));
}
