//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::config::PermissionMode;

/// Voicenote - record a voice note and play it back
#[derive(Parser, Debug)]
#[command(name = "voicenote")]
#[command(version)]
#[command(about = "Minimal voice note recorder with single-slot playback")]
#[command(long_about = None)]
pub struct Cli {
    /// Directory holding the recording slot (defaults to the platform data dir)
    #[arg(short = 's', long, value_name = "DIR", global = true)]
    pub storage_dir: Option<String>,

    /// Permission gate mode
    #[arg(short = 'p', long, value_name = "MODE", global = true)]
    pub permission: Option<PermissionArg>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a voice note until Enter or Ctrl-C
    Record,
    /// Play the last recording
    Play,
    /// Show permission state and the current recording slot
    Status,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Permission mode argument for clap ValueEnum
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PermissionArg {
    Probe,
    Granted,
    Denied,
}

impl From<PermissionArg> for PermissionMode {
    fn from(arg: PermissionArg) -> Self {
        match arg {
            PermissionArg::Probe => PermissionMode::Probe,
            PermissionArg::Granted => PermissionMode::Granted,
            PermissionArg::Denied => PermissionMode::Denied,
        }
    }
}

impl From<PermissionMode> for PermissionArg {
    fn from(mode: PermissionMode) -> Self {
        match mode {
            PermissionMode::Probe => PermissionArg::Probe,
            PermissionMode::Granted => PermissionArg::Granted,
            PermissionMode::Denied => PermissionArg::Denied,
        }
    }
}

/// Parsed runtime options after merging config sources
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub storage_dir: PathBuf,
    pub permission: PermissionMode,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &["storage_dir", "permission"];

/// Valid permission mode values
pub const VALID_PERMISSION_MODES: &[&str] = &["probe", "granted", "denied"];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
