//! Application configuration value object

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::InvalidPermissionModeError;

/// How the microphone permission gate is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionMode {
    /// Probe the default input device on first request
    #[default]
    Probe,
    /// Treat permission as granted without probing
    Granted,
    /// Treat permission as denied
    Denied,
}

impl PermissionMode {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Probe => "probe",
            Self::Granted => "granted",
            Self::Denied => "denied",
        }
    }
}

impl fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PermissionMode {
    type Err = InvalidPermissionModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "probe" => Ok(Self::Probe),
            "granted" => Ok(Self::Granted),
            "denied" => Ok(Self::Denied),
            _ => Err(InvalidPermissionModeError {
                input: s.to_string(),
            }),
        }
    }
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the recording slot
    pub storage_dir: Option<String>,
    /// Permission gate mode: probe, granted, or denied
    pub permission: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            storage_dir: None,
            permission: Some(PermissionMode::Probe.as_str().to_string()),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            storage_dir: other.storage_dir.or(self.storage_dir),
            permission: other.permission.or(self.permission),
        }
    }

    /// Get the configured storage directory, if any
    pub fn storage_dir(&self) -> Option<PathBuf> {
        self.storage_dir.as_ref().map(PathBuf::from)
    }

    /// Get permission as parsed PermissionMode, or default if not set/invalid
    pub fn permission_or_default(&self) -> PermissionMode {
        self.permission
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}
