use thiserror::Error;

use super::Endpoint;

/// powerpoll error types
#[derive(Error, Debug)]
pub enum PowerError {
    /// Upstream call failed to reach the service or to decode its reply
    #[error("{endpoint} request failed: {message}")]
    Request { endpoint: Endpoint, message: String },

    /// Upstream replied with a false success flag
    #[error("{endpoint} rejected: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        endpoint: Endpoint,
        message: Option<String>,
    },

    /// Upstream replied with success but the body has an unexpected shape
    #[error("{endpoint} payload malformed: {message}")]
    Malformed { endpoint: Endpoint, message: String },

    /// Every endpoint failed in one cycle
    #[error("no endpoint returned data; check the consumer number or the network")]
    AggregateEmpty,

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse or serialize JSON
    #[error("parse error: {0}")]
    Parse(String),
}

impl PowerError {
    /// Endpoint this error is scoped to, if any
    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            PowerError::Request { endpoint, .. }
            | PowerError::Rejected { endpoint, .. }
            | PowerError::Malformed { endpoint, .. } => Some(*endpoint),
            _ => None,
        }
    }
}

/// Result type alias for powerpoll
pub type Result<T> = std::result::Result<T, PowerError>;
