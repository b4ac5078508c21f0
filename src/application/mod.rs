//! Application layer - Session controller and port interfaces
//!
//! Contains the record/playback orchestration and trait definitions
//! for external system interactions.

pub mod controller;
pub mod ports;

// Re-export the controller surface
pub use controller::{ControllerError, SessionController};
