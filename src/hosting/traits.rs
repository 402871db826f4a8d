use async_trait::async_trait;
use serde_json::Value;

use crate::error::BackendError;

/// Host booking endpoint
#[async_trait]
pub trait BookingSource: Send + Sync {
    /// Raw bookings of the signed-in host. Fails with
    /// [`BackendError::AuthorizationPending`] before host onboarding completes.
    async fn host_bookings(&self) -> Result<Value, BackendError>;
}
