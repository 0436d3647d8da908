//! File logging. The terminal belongs to the UI, so nothing is written to
//! stdout.

use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

const LOG_FILE: &str = "postview.log";

/// Directory holding the log file: `$XDG_DATA_HOME/postview`, or the
/// working directory when no data dir is known.
pub fn log_dir() -> PathBuf {
  dirs::data_dir()
    .map(|dir| dir.join("postview"))
    .unwrap_or_else(|| PathBuf::from("."))
}

/// Install the global subscriber writing to the log file.
///
/// Level comes from RUST_LOG, defaulting to "info". The returned guard
/// flushes pending lines on drop and must be held for the program lifetime.
pub fn init() -> Result<WorkerGuard> {
  let dir = log_dir();
  std::fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let file_appender = tracing_appender::rolling::never(&dir, LOG_FILE);
  let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

  let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

  tracing_subscriber::registry()
    .with(
      tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(env_filter),
    )
    .try_init()
    .map_err(|e| eyre!("Failed to install log subscriber: {}", e))?;

  Ok(guard)
}
