//! Logging setup for the `tracevis` binary
//!
//! Events go through `tracing`; the filter honours `RUST_LOG` and otherwise
//! defaults to `warn` (`debug` with `-v`). While the terminal UI owns the
//! screen, events are written to a file instead of stderr.

use crate::errors::{Result, VisualizerError};
use std::env;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Where log events are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    /// `tracevis.log` under the system temp directory
    pub fn default_file() -> Result<Self> {
        let dir = env::temp_dir().join("tracevis-logs");
        fs::create_dir_all(&dir)?;
        Ok(LogTarget::File(dir.join("tracevis.log")))
    }
}

fn filter(verbose: bool) -> Result<EnvFilter> {
    let default = if verbose { "tracevis=debug" } else { "warn" };
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))
        .map_err(|e| VisualizerError::invalid_option(format!("bad log filter: {}", e)))
}

/// Install the global subscriber
///
/// Fails if a subscriber is already installed or the log file cannot be
/// created.
pub fn init_logging(verbose: bool, target: &LogTarget) -> Result<()> {
    let filter = filter(verbose)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = open_log(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };
    installed.map_err(|e| {
        VisualizerError::Io(std::io::Error::other(format!(
            "cannot install log subscriber: {}",
            e
        )))
    })?;

    tracing::debug!(?target, "logging initialized");
    Ok(())
}

fn open_log(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}
