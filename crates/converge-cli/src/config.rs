//! Configuration file handling for converge.
//!
//! Looks for `.config/converge.json` in the current directory or any parent directory.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

const CONFIG_PATH: &str = ".config/converge.json";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Connection string used when neither `--database-url` nor
    /// `CONVERGE_DATABASE_URL` is given.
    pub database_url: Option<String>,
    /// Log filter used when `RUST_LOG` is unset.
    pub log: Option<String>,
    /// Fact files deployed when none are given on the command line,
    /// relative to the project root.
    pub facts: Vec<Utf8PathBuf>,
}

/// A loaded configuration and the directory holding `.config/`.
#[derive(Debug, Default)]
pub struct Project {
    pub config: Config,
    pub root: Option<Utf8PathBuf>,
}

impl Project {
    /// Fact files from the configuration, resolved against the project root.
    pub fn facts(&self) -> Vec<Utf8PathBuf> {
        self.config
            .facts
            .iter()
            .map(|path| match &self.root {
                Some(root) if path.is_relative() => root.join(path),
                _ => path.clone(),
            })
            .collect()
    }
}

/// Load configuration from `.config/converge.json`, searching up the directory tree.
pub fn load() -> Result<Project, ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::Io(e.to_string()))?;
    let cwd = Utf8PathBuf::from_path_buf(cwd)
        .map_err(|path| ConfigError::Io(format!("non UTF-8 working directory: {}", path.display())))?;
    load_from(&cwd)
}

/// Load configuration starting from a specific directory. A missing file
/// yields the defaults.
pub fn load_from(start: &Utf8Path) -> Result<Project, ConfigError> {
    let Some(config_path) = find_config_file(start) else {
        return Ok(Project::default());
    };
    let content =
        std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io(e.to_string()))?;
    let config: Config =
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    tracing::debug!(path = %config_path, "loaded configuration");
    Ok(Project {
        config,
        root: config_path
            .parent()
            .and_then(Utf8Path::parent)
            .map(Utf8Path::to_path_buf),
    })
}

/// Find `.config/converge.json` by searching up the directory tree.
fn find_config_file(start: &Utf8Path) -> Option<Utf8PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_PATH))
        .find(|path| path.exists())
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading the file
    #[error("Failed to read {CONFIG_PATH}: {0}")]
    Io(String),
    /// Malformed JSON or an unknown key
    #[error("Failed to parse {CONFIG_PATH}: {0}")]
    Parse(String),
}
