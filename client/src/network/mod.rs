//! Network Module
//!
//! HTTP client for the remote training, prediction and sample storage service.

pub mod api;

pub use api::ApiClient;

use thiserror::Error;

/// Remote call errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Connection error: {0}")]
    Network(String),
    #[error("Timeout: the server is taking too long to respond")]
    Timeout,
    /// The service rejected the request (bad input, too few samples, ...).
    #[error("{0}")]
    RemoteValidation(String),
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}
