//! Error types for the call agent

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the call agent
#[derive(Error, Debug)]
pub enum Error {
    // Reply generation errors
    #[error("LLM error: {0}")]
    Llm(String),

    // Durable storage errors
    #[error("Persistence error: {0}")]
    Persistence(String),

    // Request authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),

    // Inbound events that cannot be resolved to a session
    #[error("Invalid inbound event: {0}")]
    InvalidEvent(String),

    // Collaborator calls that exceeded their budget
    #[error("Timeout after {0}ms")]
    Timeout(u64),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Create an LLM error from a string
    pub fn llm<S: Into<String>>(msg: S) -> Self {
        Error::Llm(msg.into())
    }

    /// Create a persistence error from a string
    pub fn persistence<S: Into<String>>(msg: S) -> Self {
        Error::Persistence(msg.into())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}
