use crate::infrastructure::error::InfraError;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "FOCUSMATE_LOG";
pub const COMMAND_LOG: &str = "commands.log";

/// Installs the global subscriber: readable lines on stderr and JSON lines
/// appended to `<logs_dir>/commands.log`.
///
/// A second call (tests, embedding) leaves the existing subscriber in place.
pub fn init_logging(logs_dir: &Path) -> Result<PathBuf, InfraError> {
    fs::create_dir_all(logs_dir)?;
    let log_path = logs_dir.join(COMMAND_LOG);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| "info".into());
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_current_span(false);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
    Ok(log_path)
}
