//! Permission gate backed by an input device probe
//!
//! Desktop hosts expose no authorization dialog; the practical
//! equivalent is whether a default input device can be resolved at all.
//! The probe runs once and its outcome is cached for the process
//! lifetime.

use std::sync::Mutex;

use async_trait::async_trait;
use cpal::traits::HostTrait;
use tracing::debug;

use crate::application::ports::PermissionGate;
use crate::domain::permission::PermissionState;

/// Microphone gate resolved by probing the default cpal input device
pub struct ProbeGate {
    state: Mutex<PermissionState>,
}

impl ProbeGate {
    /// Create a gate in the undetermined state
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PermissionState::Undetermined),
        }
    }

    fn probe() -> PermissionState {
        let host = cpal::default_host();
        match host.default_input_device() {
            Some(_) => PermissionState::Granted,
            None => PermissionState::Denied,
        }
    }
}

impl Default for ProbeGate {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PermissionGate for ProbeGate {
    fn query(&self) -> PermissionState {
        *self.state.lock().unwrap()
    }

    async fn request_if_undetermined(&self) -> PermissionState {
        let current = self.query();
        if current.is_resolved() {
            return current;
        }

        // Device enumeration can block on some backends
        let probed = tokio::task::spawn_blocking(Self::probe)
            .await
            .unwrap_or(PermissionState::Undetermined);

        let mut state = self.state.lock().unwrap();
        if *state == PermissionState::Undetermined {
            *state = probed;
            debug!(state = %probed, "microphone permission resolved");
        }
        *state
    }
}
