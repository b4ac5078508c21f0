//! cpal-backed device session

use std::sync::atomic::{AtomicBool, Ordering};

use cpal::traits::HostTrait;
use tracing::debug;

use crate::application::ports::{AudioSessionError, DeviceSession};

/// Shared record-and-play session over the default cpal host.
///
/// Desktop hosts have no exclusive session object to hold; activation
/// verifies that both endpoints of the duplex duty exist and marks the
/// session active so repeated calls stay cheap.
pub struct CpalDeviceSession {
    active: AtomicBool,
}

impl CpalDeviceSession {
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
        }
    }
}

impl Default for CpalDeviceSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceSession for CpalDeviceSession {
    fn activate(&self) -> Result<(), AudioSessionError> {
        if self.active.load(Ordering::SeqCst) {
            return Ok(());
        }

        let host = cpal::default_host();
        if host.default_input_device().is_none() {
            return Err(AudioSessionError::NoInputDevice);
        }
        // Playback routes at the default output, not a fallback endpoint
        if host.default_output_device().is_none() {
            return Err(AudioSessionError::NoOutputDevice);
        }

        self.active.store(true, Ordering::SeqCst);
        debug!("audio session activated");
        Ok(())
    }

    fn deactivate(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            debug!("audio session deactivated");
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}
