//! Error types for dnsync
//!
//! This module defines all error types used throughout the crate.
//!
//! Errors fall into five groups:
//! - configuration (`Config`), reported before any remote call
//! - transport (`Transport`, `Http`, `RetriesExhausted`, `Json`)
//! - application (`Api`), a structured error returned by the remote service
//! - conversion (`Conversion`), raised by a [`RecordCodec`](crate::traits::RecordCodec)
//! - consistency (`Inconsistent`), remote state the engine refuses to guess about
//!
//! Cancellation of a [`CallContext`](crate::context::CallContext) surfaces as
//! `Cancelled` or `DeadlineExceeded`.
//!
//! Wrapping errors already print their cause, so none of them report it
//! again through `std::error::Error::source`.

use crate::record::Record;
use thiserror::Error;

/// Result type alias for dnsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dnsync
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network-level failure (connect, send, body read)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("HTTP error: {status}")]
    Http {
        /// Response status code
        status: u16,
    },

    /// Structured error envelope returned by the remote service
    #[error("API error: {code} - {message}")]
    Api {
        /// Remote error code
        code: i64,
        /// Remote error message
        message: String,
    },

    /// Every attempt allowed by the retry policy failed
    #[error("max retries exceeded after {attempts} attempt(s), last error: {last}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// The failure observed on the final attempt
        last: Box<Error>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(serde_json::Error),

    /// Record could not be converted to or from the provider representation
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Remote state contradicts an invariant the engine relies on
    #[error("Inconsistent remote state: {0}")]
    Inconsistent(String),

    /// The call context was cancelled
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// The call context deadline passed
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// An error annotated with the phase that produced it
    #[error("{context}: {inner}")]
    Context {
        /// Phase description, e.g. "failed to list records"
        context: String,
        /// Underlying error
        inner: Box<Error>,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create an application error from a remote error envelope
    pub fn api(code: i64, message: impl Into<String>) -> Self {
        Self::Api {
            code,
            message: message.into(),
        }
    }

    /// Create a conversion error
    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::Conversion(msg.into())
    }

    /// Create a consistency error
    pub fn inconsistent(msg: impl Into<String>) -> Self {
        Self::Inconsistent(msg.into())
    }

    /// Create a cancellation error
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Wrap this error with the phase that produced it
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            inner: Box::new(self),
        }
    }

    /// The innermost error, skipping `Context` wrappers
    pub fn root(&self) -> &Error {
        match self {
            Self::Context { inner, .. } => inner.root(),
            other => other,
        }
    }

    /// Whether this error came from a cancelled or expired call context
    pub fn is_cancellation(&self) -> bool {
        matches!(self.root(), Self::Cancelled(_) | Self::DeadlineExceeded)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

/// Failure of a batch operation after zero or more records succeeded
///
/// Append, Set and Delete never discard partial progress: `completed` holds
/// the records processed before `error` occurred. Compare its length with
/// the input length to know how many succeeded.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct BatchError {
    /// Records that were fully processed before the failure
    pub completed: Vec<Record>,
    /// The error that stopped the batch
    pub error: Error,
}

impl BatchError {
    /// Create a batch error
    pub fn new(completed: Vec<Record>, error: Error) -> Self {
        Self { completed, error }
    }

    /// Create a batch error with no completed records
    pub fn empty(error: Error) -> Self {
        Self::new(Vec::new(), error)
    }
}

/// Result type for batch operations
pub type BatchResult = std::result::Result<Vec<Record>, BatchError>;
