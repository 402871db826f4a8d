use thiserror::Error;

/// Classified failure of a backend call
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed backend payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// The user has not finished host onboarding yet
    #[error("host entitlement pending")]
    AuthorizationPending,
}

impl BackendError {
    /// Whether the caller may offer a retry
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Network(_) => true,
            BackendError::Status { status, .. } => *status == 429 || *status >= 500,
            BackendError::Decode(_) | BackendError::AuthorizationPending => false,
        }
    }
}
