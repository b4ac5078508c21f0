//! Pre-resolved permission gate

use async_trait::async_trait;

use crate::application::ports::PermissionGate;
use crate::domain::permission::PermissionState;

/// Permission gate with a fixed, pre-resolved state.
///
/// Used when configuration overrides probing, and as the deterministic
/// gate in tests.
pub struct FixedGate {
    state: PermissionState,
}

impl FixedGate {
    /// Create a gate pinned to `state`
    pub const fn new(state: PermissionState) -> Self {
        Self { state }
    }

    /// Gate that always grants capture
    pub const fn granted() -> Self {
        Self::new(PermissionState::Granted)
    }

    /// Gate that always denies capture
    pub const fn denied() -> Self {
        Self::new(PermissionState::Denied)
    }
}

#[async_trait]
impl PermissionGate for FixedGate {
    fn query(&self) -> PermissionState {
        self.state
    }

    async fn request_if_undetermined(&self) -> PermissionState {
        self.state
    }
}
