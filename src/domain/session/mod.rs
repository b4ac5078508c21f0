//! Record/playback session domain

pub mod snapshot;
pub mod state;

pub use snapshot::{ControllerSnapshot, ErrorKind};
pub use state::{InvalidStateTransition, TransportSession, TransportState};
