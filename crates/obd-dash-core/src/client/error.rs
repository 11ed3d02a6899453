//! Client errors

use thiserror::Error;

/// Errors returned by telemetry backend calls
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never got a response
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// HTTP 401; the session has been torn down
    #[error("Unauthorized: session expired or invalid")]
    Unauthorized,

    /// Any other non-success status
    #[error("Backend error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// `error` or `message` from the body, else the status reason
        message: String,
    },

    /// The body did not decode
    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),

    /// An endpoint path could not be joined to the base URL
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// HTTP status associated with the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized => Some(401),
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the error ended the session
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }
}
