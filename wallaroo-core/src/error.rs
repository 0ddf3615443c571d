//! Error taxonomy for the Wallaroo client
//!
//! The core never recovers from these; every error is returned to the
//! immediate caller.

use reqwest::StatusCode;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to a Wallaroo service
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The service answered outside the success range of the operation
    #[error("Remote error ({status}): {body}")]
    Remote { status: StatusCode, body: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{kind}#{operation} is not implemented")]
    NotImplemented {
        kind: &'static str,
        operation: &'static str,
    },

    #[error("Unknown attribute '{name}' for resource kind {kind}")]
    UnknownAttribute { kind: &'static str, name: String },

    #[error("Attribute '{name}' of resource kind {kind} is read-only")]
    ReadOnlyAttribute { kind: &'static str, name: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Status code of a remote error, if this is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Exit code a shell should use when a command fails with this error.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 2,
            Self::Remote { .. } => 3,
            _ => 1,
        }
    }
}
