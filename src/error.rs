//! Unified error handling for skylark.
//!
//! Per-message and per-handler failures are contained at the dispatch
//! boundary and never unwind past the read loop; only transport-level
//! failures terminate the connection.

use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur while a handler runs.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("send error: {0}")]
    Send(#[from] mpsc::error::SendError<String>),

    #[error("database error: {0}")]
    Db(#[from] crate::db::DbError),

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Send(_) => "send_error",
            Self::Db(_) => "database_error",
            Self::Malformed(_) => "malformed_message",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Result type for handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// Misuse of the continuation registry. Reported, never fatal.
#[derive(Debug, Error)]
pub enum ContinuationError {
    /// Resume of a key that is not pending: either it was never registered
    /// or it has already been resumed (continuations are one-shot).
    #[error("no pending continuation for {0:?}")]
    NotPending(String),
}

/// Transport-level failures. Fatal to the connection attempt.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("worker failed to start")]
    WorkerUnavailable,
}
