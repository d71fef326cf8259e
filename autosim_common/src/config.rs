//! Configuration loading traits and shared types.
//!
//! Every configuration file in the workspace is TOML. Any
//! `serde`-deserializable struct gets [`ConfigLoader::load`] for free and
//! is expected to embed [`SharedConfig`] under a `[shared]` table.
//!
//! # Usage
//!
//! ```rust,no_run
//! use autosim_common::config::{ConfigError, ConfigLoader, SharedConfig};
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Debug, Deserialize)]
//! struct PlatformConfig {
//!     #[serde(default)]
//!     shared: SharedConfig,
//! }
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = PlatformConfig::load(Path::new("drivetrain.toml"))?;
//!     config.shared.validate()?;
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading and validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Configuration file not found at the given path.
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// File unreadable or TOML invalid.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Logging verbosity. Lowercase in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Matching `tracing` level, for building subscriber filters.
    pub const fn as_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

/// Fields shared by every configuration file.
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "autosim-practice-bot"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedConfig {
    #[serde(default)]
    pub log_level: LogLevel,

    /// Instance identifier, used as a logging span field.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    "autosim".to_string()
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// # Errors
    ///
    /// `ConfigError::ValidationError` if `service_name` is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "shared.service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load a configuration struct from a TOML file.
///
/// - `ConfigError::FileNotFound` if the file does not exist
/// - `ConfigError::ParseError` if it cannot be read or is not valid TOML
///   for `Self`
///
/// Semantic validation is left to the caller.
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.display().to_string())
            } else {
                ConfigError::ParseError(format!("{}: {e}", path.display()))
            }
        })?;
        Self::from_toml(&content)
    }

    /// Parse from an in-memory TOML document.
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[derive(Debug, Deserialize)]
    struct Wrapper {
        #[serde(default)]
        shared: SharedConfig,
    }

    #[test]
    fn log_level_lowercase_in_toml() {
        #[derive(Debug, Deserialize)]
        struct Level {
            level: LogLevel,
        }
        let parsed: Level = toml::from_str("level = \"warn\"").unwrap();
        assert_eq!(parsed.level, LogLevel::Warn);
        assert!(toml::from_str::<Level>("level = \"WARN\"").is_err());
    }

    #[test]
    fn log_level_maps_to_tracing() {
        assert_eq!(LogLevel::default().as_tracing_level(), tracing::Level::INFO);
        assert_eq!(LogLevel::Trace.as_tracing_level(), tracing::Level::TRACE);
    }

    #[test]
    fn shared_table_is_optional() {
        let w = Wrapper::from_toml("").unwrap();
        assert_eq!(w.shared, SharedConfig::default());
        assert!(w.shared.validate().is_ok());
    }

    #[test]
    fn blank_service_name_rejected() {
        let w = Wrapper::from_toml("[shared]\nservice_name = \"  \"\n").unwrap();
        assert!(matches!(
            w.shared.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn load_missing_file() {
        let result = Wrapper::load(Path::new("/nonexistent/autosim/drivetrain.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "[shared]\nlog_level = \"debug\"\nservice_name = \"bench-bot\"\n"
        )
        .unwrap();
        file.flush().unwrap();

        let w = Wrapper::load(file.path()).unwrap();
        assert_eq!(w.shared.log_level, LogLevel::Debug);
        assert_eq!(w.shared.service_name, "bench-bot");
    }

    #[test]
    fn load_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[shared\nlog_level = ").unwrap();
        let result = Wrapper::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
