// Logging for Workhorse
//
// This module wires the `tracing` ecosystem up for applications embedding
// the pool. The pool itself only emits `tracing` events; nothing is
// printed unless a subscriber is installed, for example with one of the
// `init*` functions below.
//
// # Usage Examples
//
// ```rust
// use workhorse::logging;
//
// // INFO level, human-readable console output
// logging::init_default();
//
// // Or pick the settings explicitly
// let config = logging::LogConfig {
//     level: tracing::Level::DEBUG,
//     json_format: false,
//     ..Default::default()
// };
// logging::init(config);
// ```
//
// ## Using Log Macros
//
// ```rust
// use workhorse::{log_pool, log_task, pool_span};
//
// let span = pool_span!("ingest", pool_size = 8);
// let _guard = span.enter();
//
// log_pool!("ingest", "started");
// log_task!("fetch-page-7", "queued");
// ```

use std::fs::OpenOptions;
use std::io;
use std::sync::{Arc, Once};

use tracing::{Level, Subscriber};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Configuration for the logging system
///
/// # Examples
///
/// ```rust
/// use workhorse::logging::LogConfig;
/// use tracing::Level;
///
/// let config = LogConfig {
///     level: Level::DEBUG,
///     json_format: true,
///     show_file_line: false,
///     show_thread_info: true,
///     show_time: true,
///     target_filters: Some("workhorse=debug,workhorse::thread=trace".to_string()),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: Level,
    /// Whether to use JSON format for logs
    pub json_format: bool,
    /// Whether to include file and line information
    pub show_file_line: bool,
    /// Whether to include thread name/id. Worker threads are named, so
    /// this is the easiest way to tell workers apart.
    pub show_thread_info: bool,
    /// Whether to include timestamps
    pub show_time: bool,
    /// Target filter expressions (format: "target=level,target2=level2,...")
    pub target_filters: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_file_line: true,
            show_thread_info: true,
            show_time: true,
            target_filters: None,
        }
    }
}

// Initialization guard to ensure we only initialize once
static INIT: Once = Once::new();

fn env_filter(config: &LogConfig) -> EnvFilter {
    let mut env_filter = EnvFilter::from_default_env().add_directive(config.level.into());

    if let Some(filters) = &config.target_filters {
        for filter in filters.split(',') {
            if let Ok(directive) = filter.parse() {
                env_filter = env_filter.add_directive(directive);
            }
        }
    }

    env_filter
}

/// Initialize the logging system with the given configuration
///
/// Safe to call multiple times; only the first call takes effect.
pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        let registry = tracing_subscriber::registry().with(env_filter(&config));

        let subscriber: Box<dyn Subscriber + Send + Sync> = if config.json_format {
            Box::new(registry.with(fmt::layer().json().flatten_event(true)))
        } else if config.show_time {
            Box::new(registry.with(console_layer(&config)))
        } else {
            Box::new(registry.with(console_layer(&config).without_time()))
        };

        set_global_subscriber(subscriber);
    });
}

fn console_layer<S>(config: &LogConfig) -> fmt::Layer<S> {
    fmt::layer()
        .with_ansi(atty::is(atty::Stream::Stdout))
        .with_file(config.show_file_line)
        .with_line_number(config.show_file_line)
        .with_thread_names(config.show_thread_info)
        .with_thread_ids(config.show_thread_info)
}

fn set_global_subscriber<S>(subscriber: S)
where
    S: Subscriber + Send + Sync + 'static,
{
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error setting global tracing subscriber: {}", err);
    }
}

/// Initialize logging with both console and file output
///
/// The file is opened in append mode and created if missing. File output
/// never uses ANSI colors and always carries file, line and thread info.
///
/// # Errors
/// Returns an error if the log file cannot be opened.
pub fn init_with_file(config: LogConfig, log_file: &str) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;
    let file = Arc::new(file);

    INIT.call_once(|| {
        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(file)
            .with_file(true)
            .with_line_number(true)
            .with_thread_names(true)
            .with_thread_ids(true);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter(&config))
            .with(console_layer(&config))
            .with(file_layer);

        set_global_subscriber(subscriber);
    });

    Ok(())
}

/// INFO level, human-readable console output.
pub fn init_default() {
    init(LogConfig::default());
}

/// DEBUG for the crate, TRACE for the pool internals, with file/line info.
pub fn init_development() {
    init(LogConfig {
        level: Level::DEBUG,
        target_filters: Some("workhorse=debug,workhorse::thread=trace".to_string()),
        ..Default::default()
    });
}

/// JSON output without file/line information, for log aggregators.
pub fn init_production() {
    init(LogConfig {
        level: Level::INFO,
        json_format: true,
        show_file_line: false,
        show_thread_info: true,
        show_time: true,
        target_filters: None,
    });
}

/// WARN level, compact output, to keep test runs quiet.
pub fn init_test() {
    init(LogConfig {
        level: Level::WARN,
        json_format: false,
        show_file_line: true,
        show_thread_info: false,
        show_time: false,
        target_filters: None,
    });
}

/// Create a span for pool operations
///
/// ```rust
/// use workhorse::pool_span;
///
/// let span = pool_span!("ingest");
/// let _guard = span.enter();
///
/// let span = pool_span!("ingest", pool_size = 8);
/// ```
#[macro_export]
macro_rules! pool_span {
    ($pool:expr) => {
        tracing::info_span!("pool", pool = $pool)
    };
    ($pool:expr, $($fields:tt)*) => {
        tracing::info_span!("pool", pool = $pool, $($fields)*)
    };
}

/// Log pool lifecycle events
///
/// ```rust
/// use workhorse::log_pool;
///
/// log_pool!("ingest", "started");
/// log_pool!("ingest", "stopped", queued = 3);
/// ```
#[macro_export]
macro_rules! log_pool {
    ($pool:expr, $event:expr) => {
        tracing::info!(pool = $pool, event = $event);
    };
    ($pool:expr, $event:expr, $($fields:tt)*) => {
        tracing::info!(pool = $pool, event = $event, $($fields)*);
    };
}

/// Log task-level events
///
/// ```rust
/// use workhorse::log_task;
///
/// log_task!("fetch-page-7", "queued");
/// log_task!("fetch-page-7", "retried", attempt = 2);
/// ```
#[macro_export]
macro_rules! log_task {
    ($task:expr, $status:expr) => {
        tracing::debug!(task = $task, status = $status);
    };
    ($task:expr, $status:expr, $($fields:tt)*) => {
        tracing::debug!(task = $task, status = $status, $($fields)*);
    };
}

/// Log error events
///
/// ```rust
/// use workhorse::log_error;
///
/// let error = std::io::Error::new(std::io::ErrorKind::NotFound, "status file missing");
/// log_error!(error, component = "status_file");
/// ```
#[macro_export]
macro_rules! log_error {
    ($error:expr) => {
        tracing::error!(error = %$error);
    };
    ($error:expr, $($fields:tt)*) => {
        tracing::error!(error = %$error, $($fields)*);
    };
}
