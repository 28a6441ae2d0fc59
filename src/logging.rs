//! Console and rolling-file log output.

use crate::config::LogConfig;
use anyhow::{Context, Result};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Non-blocking writer for the rolling log file, or `None` when file output is off.
///
/// Lines are written from a background thread until the guard is dropped.
pub fn file_writer(config: &LogConfig) -> Result<Option<(NonBlocking, WorkerGuard)>> {
    if !config.to_file {
        return Ok(None);
    }

    std::fs::create_dir_all(&config.dir)
        .with_context(|| format!("Failed to create log directory {}", config.dir.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(config.file_prefix.clone())
        .max_log_files(config.max_files)
        .build(&config.dir)
        .with_context(|| format!("Failed to open log file in {}", config.dir.display()))?;

    Ok(Some(tracing_appender::non_blocking(appender)))
}

/// Install the global subscriber. Keep the returned guard alive while the process runs.
pub fn init(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match file_writer(config)? {
        Some((writer, guard)) => (
            Some(fmt::layer().with_ansi(false).with_writer(writer)),
            Some(guard),
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}
