//! Capture transport port

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

/// Recording errors
#[derive(Debug, Clone, Error)]
pub enum RecordingError {
    #[error("a recording is already in progress")]
    AlreadyActive,

    #[error("no recording is in progress")]
    NotActive,

    #[error("no audio input device available")]
    NoInputDevice,

    #[error("could not open {path}: {reason}")]
    TargetUnwritable { path: PathBuf, reason: String },

    #[error("failed to start capture: {0}")]
    StartFailed(String),

    #[error("failed to finalize recording: {0}")]
    FinalizeFailed(String),
}

/// Result of a finalized capture
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    /// Path of the finalized recording file
    pub path: PathBuf,
    /// Encoded size in bytes
    pub bytes: u64,
    /// Captured duration in milliseconds
    pub duration_ms: u64,
}

/// Port for signal-controlled microphone capture into a file.
#[async_trait]
pub trait CaptureTransport: Send + Sync {
    /// Begin capturing into `target`, truncating any previous content.
    ///
    /// The transport stays inactive when this fails.
    async fn begin(&self, target: &Path) -> Result<(), RecordingError>;

    /// Stop capturing, encode the buffered input, and close the file.
    async fn finish(&self) -> Result<CaptureOutcome, RecordingError>;

    /// Whether a capture is in progress
    fn is_active(&self) -> bool;

    /// Elapsed capture time in milliseconds
    fn elapsed_ms(&self) -> u64;
}
