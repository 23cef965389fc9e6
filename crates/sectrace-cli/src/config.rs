//! Configuration file support for sectrace.
//!
//! Settings live in a `.sectrace/` directory:
//! - `.sectrace/config.toml` - Configuration file
//! - `.sectrace/logs/` - Default log directory when file logging is enabled
//!
//! Config discovery searches for `.sectrace/config.toml` starting from the
//! current directory and walking up to parent directories.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sectrace::TrackerConfig;
use serde::{Deserialize, Serialize};

/// The sectrace data directory name.
pub const SECTRACE_DIR: &str = ".sectrace";
/// The config file name within the sectrace directory.
pub const CONFIG_FILE: &str = "config.toml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Initial tracker settings.
    pub tracker: TrackerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is not set.
    pub level: String,
    /// Write logs to daily files in this directory instead of stderr.
    /// Relative paths resolve against the `.sectrace/` directory.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigValidationError {}

impl Config {
    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Find and load configuration from current or parent directories.
    pub fn find_and_load() -> Result<Option<(Self, PathBuf)>> {
        let current = std::env::current_dir()?;
        Self::find_and_load_from(&current)
    }

    /// Find and load configuration starting from a specific directory.
    ///
    /// Looks for `.sectrace/config.toml` in the directory and its parents and
    /// returns the config together with its `.sectrace` directory.
    pub fn find_and_load_from(start: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start.to_path_buf();

        loop {
            let sectrace_dir = dir.join(SECTRACE_DIR);
            let config_path = sectrace_dir.join(CONFIG_FILE);
            if config_path.exists() {
                let config = Self::from_file(&config_path)?;
                return Ok(Some((config, sectrace_dir)));
            }

            if !dir.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Resolve the log directory relative to the .sectrace directory.
    pub fn resolve_log_dir(&self, sectrace_dir: Option<&Path>) -> Option<PathBuf> {
        let directory = self.logging.directory.as_ref()?;
        if directory.is_absolute() {
            Some(directory.clone())
        } else if let Some(dir) = sectrace_dir {
            Some(dir.join(directory))
        } else {
            Some(PathBuf::from(SECTRACE_DIR).join(directory))
        }
    }

    /// Get the config file path for a given .sectrace directory.
    pub fn config_path(sectrace_dir: &Path) -> PathBuf {
        sectrace_dir.join(CONFIG_FILE)
    }

    /// Validate the configuration.
    ///
    /// Returns a list of validation errors if any are found.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            errors.push(ConfigValidationError {
                field: "logging.level".to_string(),
                message: format!(
                    "Invalid level '{}'. Expected one of: {}.",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            });
        }

        if self
            .logging
            .directory
            .as_ref()
            .is_some_and(|d| d.as_os_str().is_empty())
        {
            errors.push(ConfigValidationError {
                field: "logging.directory".to_string(),
                message: "Log directory cannot be empty.".to_string(),
            });
        }

        errors
    }

    /// Write the default config into `sectrace_dir`, creating the directory.
    ///
    /// Refuses to replace an existing config unless `force` is set. Returns
    /// the path of the written file.
    pub fn write_default(sectrace_dir: &Path, force: bool) -> Result<PathBuf> {
        let config_path = Self::config_path(sectrace_dir);

        if config_path.exists() && !force {
            anyhow::bail!(
                "{} already exists. Use --force to overwrite.",
                config_path.display()
            );
        }

        std::fs::create_dir_all(sectrace_dir)
            .with_context(|| format!("Failed to create {}", sectrace_dir.display()))?;
        std::fs::write(&config_path, Self::default_toml())
            .with_context(|| format!("Failed to write {}", config_path.display()))?;

        Ok(config_path)
    }

    /// Render the default config file written by `sectrace init`.
    pub fn default_toml() -> String {
        r#"# sectrace configuration

[tracker]
# Fail on malformed usage (end without begin, begin without a name)
# instead of logging a warning.
strict = false

[logging]
# Default level when RUST_LOG is not set.
level = "info"
# Uncomment to write daily log files instead of logging to stderr.
# directory = "logs"
"#
        .to_string()
    }
}
