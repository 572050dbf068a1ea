//! Error types for the backend client.

use thiserror::Error;

/// Errors that can occur when talking to the conversion backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (connect failure, timeout, reset).
    #[error("Network error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status. `message` is the
    /// backend's own error text when it sent one.
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// A success response whose body could not be understood.
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// The request could not be built from the given input.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Artifact download answered with a non-success status.
    #[error("Download failed with status {status}")]
    Download { status: u16 },

    /// A streamed download was requested but the response had no body.
    #[error("Streaming not supported")]
    StreamingUnsupported,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request cancelled")]
    Cancelled,
}

impl ClientError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// HTTP status the backend answered with, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } | Self::Download { status } => Some(*status),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport(format!("request timed out: {}", err))
        } else if err.is_connect() {
            Self::Transport(format!("connection failed: {}", err))
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
