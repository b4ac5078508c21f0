//! Published controller state snapshot

use std::fmt;
use std::path::PathBuf;

/// Failure categories surfaced to observers.
///
/// A compact view of the error taxonomy for state rendering; the full
/// error value travels on the command result itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    PermissionDenied,
    PermissionUndetermined,
    SessionActivation,
    RecordingBusy,
    RecordingStart,
    RecordingFinalize,
    NoRecording,
    PlaybackStart,
    TransportBusy,
}

impl ErrorKind {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission denied",
            Self::PermissionUndetermined => "permission undetermined",
            Self::SessionActivation => "audio session activation failed",
            Self::RecordingBusy => "recording already active",
            Self::RecordingStart => "recording could not start",
            Self::RecordingFinalize => "recording could not be finalized",
            Self::NoRecording => "no recording available",
            Self::PlaybackStart => "playback could not start",
            Self::TransportBusy => "transport busy",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable view of the controller, published after every
/// state-changing operation.
///
/// This is the single source of truth for observers: `is_recording` and
/// `is_playing` reflect the live transports, `last_recording` is the
/// finalized slot path, and `last_error` carries the most recent
/// rejected or failed command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerSnapshot {
    pub is_recording: bool,
    pub is_playing: bool,
    pub last_recording: Option<PathBuf>,
    pub last_error: Option<ErrorKind>,
}
