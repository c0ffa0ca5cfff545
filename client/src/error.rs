//! Failures of a single prediction round trip.

use thiserror::Error;

/// Message shown when the service rejects a request without a `detail`.
pub const FALLBACK_MESSAGE: &str = "Prediction failed";

/// Everything that can go wrong between the click and the rendered result.
///
/// `Display` is the message the user sees after the `Error: ` prefix.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    /// The request never produced a response (offline, DNS, refused).
    #[error("{0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("{}", .detail.as_deref().unwrap_or(FALLBACK_MESSAGE))]
    Http {
        /// HTTP status code.
        status: u16,
        /// Server-provided `detail`, if any.
        detail: Option<String>,
    },

    /// The response body was not the JSON we expected.
    #[error("{0}")]
    Decode(String),

    /// The configured service address cannot be used.
    #[error("invalid service url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl From<reqwest::Error> for PredictError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PredictError::Decode(err.to_string())
        } else {
            PredictError::Transport(err.to_string())
        }
    }
}
