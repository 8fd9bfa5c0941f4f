//! Store error types

use thiserror::Error;

/// Errors that can occur talking to the backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Check if this error means the session is no longer usable
    pub fn is_auth_error(&self) -> bool {
        match self {
            StoreError::Auth(_) | StoreError::NotSignedIn => true,
            StoreError::ApiError { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }
}
