//! Shared audio device session port

use thiserror::Error;

/// Errors from configuring the shared hardware session
#[derive(Debug, Clone, Error)]
pub enum AudioSessionError {
    #[error("no audio input device available")]
    NoInputDevice,

    #[error("no audio output device available")]
    NoOutputDevice,
}

/// Port for the exclusive hardware session shared by record and playback.
///
/// The controller owns the only handle. Activation is idempotent;
/// deactivation is expected once both transports are idle so other
/// applications can claim the hardware.
pub trait DeviceSession: Send + Sync {
    /// Configure and activate the session for record-and-play duty,
    /// routed at the default output. Calling while already active is a
    /// no-op success.
    fn activate(&self) -> Result<(), AudioSessionError>;

    /// Release the session. No-op when inactive.
    fn deactivate(&self);

    /// Whether the session is currently active
    fn is_active(&self) -> bool;
}
