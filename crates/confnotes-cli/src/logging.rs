use std::fs;
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use confnotes_core::LoggingConfig;
use tracing_subscriber::EnvFilter;

use crate::CliError;

/// Overrides `logging.level` when set, e.g. `CONFNOTES_LOG=confnotes_exec=debug`.
pub const LOG_ENV: &str = "CONFNOTES_LOG";

pub enum LogTarget {
    Stderr,
    /// The terminal UI owns the screen, so its logs go to a file.
    File(PathBuf),
}

pub fn init(config: &LoggingConfig, target: LogTarget) -> Result<(), CliError> {
    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|err| CliError::Logging(format!("invalid level {:?}: {err}", config.level)))?,
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match target {
        LogTarget::Stderr => builder.with_writer(io::stderr).try_init(),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };
    installed.map_err(|err| CliError::Logging(err.to_string()))
}
