//! Microphone permission port

use async_trait::async_trait;

use crate::domain::permission::PermissionState;

/// Port for querying and requesting microphone authorization.
///
/// Denial is a terminal outcome, not an error: both operations are
/// infallible and the caller decides whether capture may proceed.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Read the current authorization state. No side effects.
    fn query(&self) -> PermissionState;

    /// Resolve the state if still undetermined.
    ///
    /// Issues the underlying request at most once per process; when the
    /// state is already resolved the cached value is returned
    /// immediately.
    async fn request_if_undetermined(&self) -> PermissionState;
}
