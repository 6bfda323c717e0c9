use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn log_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("genui"))
        .unwrap_or_else(|| std::env::temp_dir().join("genui"))
}

/// Sends tracing output to `genui.log` in the cache directory.
///
/// The terminal belongs to the TUI, so nothing is written to stdout/stderr.
/// The filter comes from `RUST_LOG` and defaults to `info`.
pub fn init() -> Result<PathBuf> {
    let dir = log_dir();
    std::fs::create_dir_all(&dir)
        .map_err(|e| anyhow!("Cannot create log directory {}: {}", dir.display(), e))?;

    let log_file_path = dir.join("genui.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)
        .map_err(|e| anyhow!("Cannot open log file {}: {}", log_file_path.display(), e))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(log_file))
                .with_ansi(false),
        )
        .try_init()
        .map_err(|e| anyhow!("Cannot install tracing subscriber: {}", e))?;

    Ok(log_file_path)
}
