//! Error types surfaced by the tell tracker.

use thiserror::Error;

/// Failure of the external narrative generation call or of recovering a
/// narrative from its output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("narrative generation failed: {message}")]
pub struct GenerationError {
    pub message: String,
    /// HTTP status reported by the transport, when there was one.
    pub status: Option<u16>,
}

impl GenerationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }
}

/// Errors returned by the core operations.
#[derive(Error, Debug)]
pub enum TellError {
    /// Malformed or missing input. No store access was attempted.
    #[error("{0}")]
    Validation(String),

    /// The referenced record does not resolve under the caller.
    #[error("not_found")]
    NotFound,

    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Anything unexpected. Detail is logged, never shown.
    #[error("internal error")]
    Internal(String),
}

impl TellError {
    pub fn validation(message: impl Into<String>) -> Self {
        TellError::Validation(message.into())
    }

    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            TellError::Validation(_) => 2,
            TellError::NotFound => 3,
            TellError::Generation(_) | TellError::Internal(_) => 1,
        }
    }
}

/// Errors raised by store backends.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

impl From<StoreError> for TellError {
    fn from(err: StoreError) -> Self {
        tracing::error!("Store failure: {}", err);
        TellError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TellError>;
