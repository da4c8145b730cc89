use crate::error::{LogError, LogResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable consulted for the temp directory when none is configured.
pub const TMPDIR_ENV: &str = "THREADLOG_TMPDIR";

pub const DEFAULT_PREFIX: &str = "openj9_ois_";
pub const DEFAULT_SUFFIX: &str = ".log";

/// Settings for a [`crate::ThreadLogger`].
///
/// Every field has a default, so an empty YAML document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggerConfig {
    /// Directory for log files. When absent the directory is resolved from
    /// `THREADLOG_TMPDIR`, then from the platform temp directory.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
    /// File name prefix. Default: `openj9_ois_`
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// File name suffix. Default: `.log`
    #[serde(default = "default_suffix")]
    pub suffix: String,
    /// Print the temp directory and file path to stdout when a thread opens
    /// its log. Default: true
    #[serde(default = "default_announce")]
    pub announce: bool,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_suffix() -> String {
    DEFAULT_SUFFIX.to_string()
}

fn default_announce() -> bool {
    true
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            prefix: default_prefix(),
            suffix: default_suffix(),
            announce: default_announce(),
        }
    }
}

impl LoggerConfig {
    /// Defaults with the temp directory left to environment resolution.
    ///
    /// The environment is read lazily, each time a thread opens a new log.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Loads a YAML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to a defaulted struct.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Invalid logger config")
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_announce(mut self, announce: bool) -> Self {
        self.announce = announce;
        self
    }

    /// Resolves the directory new log files are created in.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Config`] if the configured directory, the
    /// `THREADLOG_TMPDIR` variable, or the platform fallback is empty.
    pub fn resolve_temp_dir(&self) -> LogResult<PathBuf> {
        if let Some(dir) = &self.temp_dir {
            return non_empty(dir.clone(), "configured temp_dir is empty");
        }

        match std::env::var_os(TMPDIR_ENV) {
            Some(value) if value.is_empty() => Err(LogError::Config {
                message: format!("{} is set but empty", TMPDIR_ENV),
            }),
            Some(value) => Ok(PathBuf::from(value)),
            None => non_empty(std::env::temp_dir(), "platform temp directory is empty"),
        }
    }
}

fn non_empty(dir: PathBuf, message: &str) -> LogResult<PathBuf> {
    if dir.as_os_str().is_empty() {
        return Err(LogError::Config {
            message: message.to_string(),
        });
    }
    Ok(dir)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
