//! Transport state machine

use std::fmt;
use thiserror::Error;

/// Transport states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransportState {
    #[default]
    Idle,
    Recording,
    Playing,
}

impl TransportState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Playing => "playing",
        }
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: TransportState,
    pub action: &'static str,
}

/// Transport session entity.
/// Manages the mutually-exclusive record/play states.
///
/// State machine:
///   IDLE -> RECORDING (begin_recording)
///   RECORDING -> IDLE (finish_recording)
///   IDLE -> PLAYING (begin_playback)
///   PLAYING -> PLAYING (begin_playback, replacing the active session)
///   PLAYING -> IDLE (finish_playback)
///
/// Starts are strict and reject conflicting states; stops are lenient
/// no-ops so callers may issue them redundantly.
#[derive(Debug, Default)]
pub struct TransportSession {
    state: TransportState,
}

impl TransportSession {
    /// Create a new session in idle state
    pub fn new() -> Self {
        Self {
            state: TransportState::Idle,
        }
    }

    /// Get the current state
    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Check if currently idle
    pub fn is_idle(&self) -> bool {
        self.state == TransportState::Idle
    }

    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        self.state == TransportState::Recording
    }

    /// Check if currently playing
    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    /// Transition from IDLE to RECORDING
    pub fn begin_recording(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != TransportState::Idle {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "begin recording",
            });
        }
        self.state = TransportState::Recording;
        Ok(())
    }

    /// Transition from RECORDING to IDLE. No-op in any other state.
    pub fn finish_recording(&mut self) {
        if self.state == TransportState::Recording {
            self.state = TransportState::Idle;
        }
    }

    /// Transition to PLAYING from IDLE, or restart from PLAYING when the
    /// active session is being replaced. Rejected while RECORDING.
    pub fn begin_playback(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state == TransportState::Recording {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "begin playback",
            });
        }
        self.state = TransportState::Playing;
        Ok(())
    }

    /// Transition from PLAYING to IDLE. No-op in any other state.
    pub fn finish_playback(&mut self) {
        if self.state == TransportState::Playing {
            self.state = TransportState::Idle;
        }
    }
}
