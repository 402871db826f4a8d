use async_trait::async_trait;
use serde_json::Value;

use super::types::SearchRequest;
use crate::error::BackendError;

/// Property search endpoint as seen by the resolver.
/// Implemented by the HTTP client and by test doubles.
#[async_trait]
pub trait PropertySource: Send + Sync {
    /// Runs one query and returns the raw property records
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Value>, BackendError>;

    /// Get the name of the source, for logging
    fn source_name(&self) -> &'static str;
}
