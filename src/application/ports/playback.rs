//! Playback transport port

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::oneshot;

/// Playback errors
#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    #[error("no recording available to play")]
    NoRecording,

    #[error("recording at {path} is missing or empty")]
    EmptySource { path: PathBuf },

    #[error("could not decode {path}: {reason}")]
    DecodeFailed { path: PathBuf, reason: String },

    #[error("audio output device not available: {0}")]
    DeviceNotAvailable(String),

    #[error("failed to start playback: {0}")]
    StartFailed(String),
}

/// How a playback session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEnd {
    /// The source played through to its natural end
    Finished,
    /// The session was stopped or replaced before the end
    Stopped,
}

/// Receiver resolving once the corresponding playback session ends.
/// A dropped sender means the engine is gone and counts as a stop.
pub type PlaybackDone = oneshot::Receiver<PlaybackEnd>;

/// Port for decode-from-file audio playback.
///
/// The engine handle is single-valued: at most one session is live per
/// transport, and starting a new one replaces the previous session,
/// whose completion resolves as `Stopped`.
#[async_trait]
pub trait PlaybackTransport: Send + Sync {
    /// Open `source`, start playing it, and return the completion
    /// signal for this session.
    async fn play(&self, source: &Path) -> Result<PlaybackDone, PlaybackError>;

    /// Stop the active session. No-op when idle.
    async fn stop(&self);

    /// Whether a session is currently playing
    fn is_active(&self) -> bool;
}
