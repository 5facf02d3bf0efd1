//! File logging. The terminal is in raw mode while the list is shown, so
//! log records go to a file instead of stderr.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use env_logger::{Builder, Env, Target};

use crate::error::{Error, Result};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "GETNZBS_LOG";

/// `<data_dir>/getnzbs/getnzbs.log`
#[must_use]
pub fn default_log_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("getnzbs")
        .join("getnzbs.log")
}

/// Installs the global logger, appending to `log_file` or the default path.
/// Returns the file in use.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or a logger is already set.
pub fn init(log_file: Option<&Path>) -> Result<PathBuf> {
    let path = log_file.map_or_else(default_log_path, Path::to_path_buf);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    Builder::from_env(Env::new().filter_or(LOG_ENV, "info"))
        .format_timestamp_millis()
        .target(Target::Pipe(Box::new(file)))
        .try_init()
        .map_err(|e| Error::Config(format!("cannot install logger: {e}")))?;
    log::info!("getnzbs {} starting", env!("CARGO_PKG_VERSION"));
    Ok(path)
}
