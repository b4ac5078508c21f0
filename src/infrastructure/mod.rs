//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with the host audio stack (cpal, flacenc, rodio) and
//! the filesystem.

pub mod capture;
pub mod config;
pub mod device;
pub mod permission;
pub mod playback;

// Re-export adapters
pub use capture::CpalCapture;
pub use config::{default_storage_dir, XdgConfigStore};
pub use device::CpalDeviceSession;
pub use permission::{FixedGate, ProbeGate};
pub use playback::RodioPlayback;
