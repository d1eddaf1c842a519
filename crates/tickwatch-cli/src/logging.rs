//! Logging initialization

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::CliError;

const DEFAULT_LOG_FILE: &str = "data/tickwatch.log";
const LOG_FILE_ENV: &str = "TICKWATCH_LOG_FILE";

/// Console logging plus an append-only log file when one can be opened.
///
/// The filter comes from `level`, then `RUST_LOG`, then `info`.
pub fn init(level: Option<&str>) -> Result<(), CliError> {
    let filter = match level {
        Some(directive) => {
            EnvFilter::try_new(directive).map_err(|e| CliError::Logging(e.to_string()))?
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let path = std::env::var_os(LOG_FILE_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
    let (file, file_error) = match open_log_file(&path) {
        Ok(file) => (Some(file), None),
        Err(error) => (None, Some(error)),
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    let file_layer = file.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))?;

    if let Some(error) = file_error {
        tracing::warn!(path = %path.display(), %error, "file logging disabled");
    }
    Ok(())
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
