use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use confnotes_core::Config;
use confnotes_core::RepositoryKind;
use tracing::debug;

use crate::CliError;

const APP_DIR: &str = "confnotes";

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
        .join("notes.json")
}

pub fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
        .join("confnotes.log")
}

/// Reads `explicit` when given (it must exist), otherwise the per-user config
/// file if present. Anything unset falls back to defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, CliError> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => match default_config_path() {
            Some(path) => (path, false),
            None => return Ok(Config::default()),
        },
    };

    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {
            return Ok(Config::default());
        }
        Err(source) => return Err(CliError::ConfigRead { path, source }),
    };
    let config = toml::from_str::<Config>(&text)
        .map_err(|source| CliError::ConfigParse { path: path.clone(), source })?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// `--store` forces the file-backed repository at the given path.
pub fn apply_store_override(config: &mut Config, store: Option<PathBuf>) {
    if let Some(store) = store {
        config.repository.kind = RepositoryKind::JsonFile;
        config.repository.path = Some(store);
    }
}
