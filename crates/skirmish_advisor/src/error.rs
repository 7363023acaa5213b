//! Error types for advisory requests.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using [`AdvisoryError`].
pub type Result<T> = std::result::Result<T, AdvisoryError>;

/// Failure modes of an advisory request.
///
/// None of these touch the simulation: the request works on an owned copy
/// of the mirror and the caller decides what to do with the failure.
#[derive(Debug, Error)]
pub enum AdvisoryError {
    /// The transport could not deliver the request or got a non-success
    /// status back.
    #[error("Request failed: {0}")]
    Transport(String),

    /// No reply arrived within the configured timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The reply body was not a chat completion.
    #[error("Parse error: {0}")]
    Malformed(String),

    /// The reply parsed but carried no choices.
    #[error("No valid response content")]
    EmptyResponse,

    /// The request body or game state could not be encoded.
    #[error("Failed to encode request: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The background task was dropped before delivering a result.
    #[error("Advisory task ended without a result")]
    Cancelled,
}
