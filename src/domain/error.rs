//! Domain error types

use thiserror::Error;

/// Error when parsing a permission mode string
#[derive(Debug, Clone, Error)]
#[error("Invalid permission mode: \"{input}\". Valid modes are: probe, granted, denied")]
pub struct InvalidPermissionModeError {
    pub input: String,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
