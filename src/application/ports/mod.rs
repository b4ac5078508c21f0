//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod config;
pub mod device;
pub mod permission;
pub mod playback;

// Re-export common types
pub use capture::{CaptureOutcome, CaptureTransport, RecordingError};
pub use config::ConfigStore;
pub use device::{AudioSessionError, DeviceSession};
pub use permission::PermissionGate;
pub use playback::{PlaybackDone, PlaybackEnd, PlaybackError, PlaybackTransport};
