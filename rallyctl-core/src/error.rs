/// Structured error types for rallyctl-core.
///
/// Library consumers get composable `thiserror` errors; the binary crate
/// (rallyctl-cli) wraps them with `anyhow` context.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for rallyctl-core operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// Required environment variable absent or empty
    #[error("Missing required environment variable: {name}")]
    MissingEnv { name: String },

    /// Environment variable present but unusable
    #[error("Invalid value for {name}: {reason}")]
    InvalidEnv { name: String, reason: String },

    /// Config file could not be read
    #[error("Failed to read config file {path:?}: {source}")]
    ReadConfig { path: PathBuf, source: io::Error },

    /// Config file is not valid TOML for our schema
    #[error("Failed to parse config file {path:?}: {source}")]
    ParseConfig {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Config file parsed but values are inconsistent
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

/// Result type alias for rallyctl-core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create a missing environment variable error
    pub fn missing_env(name: impl Into<String>) -> Self {
        Self::MissingEnv { name: name.into() }
    }

    /// Create an invalid environment variable error
    pub fn invalid_env(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEnv {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}
