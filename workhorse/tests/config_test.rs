// Integration tests for pool configuration defaults

use std::time::Duration;

use workhorse::thread::config::*;
use workhorse::thread::ThreadPool;

#[test]
fn test_config_defaults() {
    let config = ThreadPoolConfig::default();

    assert_eq!(config.pool_size, num_cpus::get());
    assert_eq!(config.heartbeat_interval, Duration::from_millis(1000));
    assert_eq!(config.thread_name_prefix, "worker-");
    assert_eq!(config.name, DEFAULT_POOL_NAME);
}

#[test]
fn test_with_pool_size_keeps_other_defaults() {
    let config = ThreadPoolConfig::with_pool_size(3);

    assert_eq!(config.pool_size, 3);
    assert_eq!(config.heartbeat_interval, DEFAULT_HEARTBEAT_INTERVAL);
}

#[test]
fn test_pool_uses_config() {
    let pool = ThreadPool::with_config(ThreadPoolConfig {
        thread_name_prefix: "io-".to_string(),
        ..ThreadPoolConfig::with_pool_size(3)
    });

    assert_eq!(pool.pool_size(), 3);
    let names: Vec<String> = pool.snapshot().workers.into_iter().map(|w| w.name).collect();
    assert_eq!(names, vec!["io-0", "io-1", "io-2"]);
    assert!(format!("{:?}", pool).contains("pool_size: 3"));
}
