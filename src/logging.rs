//! Structured logging configuration
//!
//! Foreground commands log to stderr so stdout stays free for user-facing
//! output. The detached worker has no standard streams at all, so it always
//! writes to a daily rolling file under the configured log directory.

use crate::config::{Config, LoggingConfig};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const LOG_FILE_PREFIX: &str = "claude-monitor-lite.log";

/// Where a process should send its logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// An interactive invocation; honors `logging.output`
    Foreground,
    /// The detached worker; file only
    Daemon,
}

/// Initialize the logging system based on configuration.
///
/// The returned guard flushes the file writer when dropped and must be held
/// for the lifetime of the process.
pub fn init_logging(config: &Config, target: LogTarget) -> Option<WorkerGuard> {
    let logging = &config.logging;

    // Build environment filter
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let output = match target {
        LogTarget::Daemon => "file",
        LogTarget::Foreground => logging.output.as_str(),
    };

    match output {
        "file" => init_file_logging(env_filter, logging, &config.paths.log_directory),
        "both" => init_combined_logging(env_filter, logging, &config.paths.log_directory),
        _ => {
            init_console_logging(env_filter, logging);
            None
        }
    }
}

fn init_console_logging(filter: EnvFilter, logging: &LoggingConfig) {
    let subscriber = tracing_subscriber::registry().with(filter);

    let result = match logging.format.as_str() {
        "json" => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true),
            )
            .try_init(),
        _ => subscriber
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_ansi(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init(),
    };

    if let Err(e) = result {
        eprintln!("Warning: logging already initialized: {}", e);
    }
}

fn init_file_logging(
    filter: EnvFilter,
    logging: &LoggingConfig,
    log_dir: &Path,
) -> Option<WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all(log_dir) {
        // Nothing sensible to fall back to when the worker has no stderr
        eprintln!("Warning: failed to create log directory {}: {}", log_dir.display(), e);
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry().with(filter);

    let _ = match logging.format.as_str() {
        "json" => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init(),
        _ => subscriber
            .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
            .try_init(),
    };

    Some(guard)
}

fn init_combined_logging(
    filter: EnvFilter,
    logging: &LoggingConfig,
    log_dir: &Path,
) -> Option<WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all(log_dir) {
        eprintln!("Warning: failed to create log directory {}: {}", log_dir.display(), e);
        init_console_logging(filter, logging);
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry().with(filter);

    let _ = match logging.format.as_str() {
        "json" => subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(fmt::layer().json().with_writer(non_blocking))
            .try_init(),
        _ => subscriber
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .try_init(),
    };

    Some(guard)
}

/// Root span for one daemon run, tagged with a fresh run id
pub fn run_span() -> tracing::Span {
    tracing::info_span!("daemon", run_id = %uuid::Uuid::new_v4())
}
