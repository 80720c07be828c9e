//! Error types for taskflow-client

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by the API clients and the task board
#[derive(Debug, Error)]
pub enum ClientError {
    /// Missing required field, invalid enum value, or a 400/422 from the server
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// The server no longer has the referenced record
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Missing, expired or rejected credentials
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Network failure, 5xx, or any status the client does not expect
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// No session is present
    #[error("Not signed in")]
    SignedOut,
}

impl ClientError {
    /// Create a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Map a non-success status and its error message to a variant
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Self::Validation { message }
            }
            StatusCode::NOT_FOUND => Self::NotFound { message },
            StatusCode::UNAUTHORIZED => Self::Unauthorized { message },
            StatusCode::CONFLICT => Self::Conflict { message },
            other => Self::Transport {
                message: format!("{}: {}", other, message),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::transport(format!("Failed to decode response: {}", err));
        }
        Self::transport(err.to_string())
    }
}

impl From<taskflow_core::Error> for ClientError {
    fn from(err: taskflow_core::Error) -> Self {
        match err {
            taskflow_core::Error::InvalidInput(message) => Self::Validation { message },
            taskflow_core::Error::TaskNotFound(id) => Self::NotFound {
                message: format!("Task {} not found", id),
            },
            other => Self::transport(other.to_string()),
        }
    }
}
