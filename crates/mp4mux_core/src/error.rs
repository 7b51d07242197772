//! Error types for mp4mux core.

use crate::engine::EngineError;
use thiserror::Error;

/// Result type for muxer control operations.
pub type MuxResult<T> = Result<T, MuxError>;

/// Errors that can occur while configuring or starting a muxer session.
#[derive(Debug, Error)]
pub enum MuxError {
    /// A parameter was malformed, empty when required, or out of range.
    #[error("invalid argument for {field}: {message}")]
    InvalidArgument {
        /// The parameter that was rejected.
        field: &'static str,
        /// Description of why it was rejected.
        message: String,
    },

    /// An elementary stream index was outside the configured stream list.
    #[error("stream index {index} out of bounds: {count} streams configured")]
    StreamIndexOutOfBounds {
        /// The requested stream slot.
        index: usize,
        /// Number of streams currently configured.
        count: usize,
    },

    /// An operation was invoked in the wrong lifecycle phase.
    #[error("{operation} is not allowed once the session has started")]
    InvalidState {
        /// The operation that was rejected.
        operation: &'static str,
    },

    /// The per-session elementary stream limit was exceeded.
    #[error("too many elementary streams: limit is {limit}")]
    TooManyStreams {
        /// Maximum number of streams per session.
        limit: usize,
    },

    /// Start was requested with no elementary streams configured.
    #[error("no elementary streams configured")]
    NoStreams,

    /// Start was requested with no output target configured.
    #[error("no output target configured")]
    NoOutput,

    /// The configuration violates the interleave invariants and strict
    /// mode forbids repairing it.
    #[error("inconsistent configuration: {message}")]
    InvalidConfiguration {
        /// Description of the offending settings.
        message: String,
    },

    /// Failure surfaced unchanged from the muxing engine during start.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

impl MuxError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            message: message.into(),
        }
    }

    /// Creates an invalid state error.
    pub fn invalid_state(operation: &'static str) -> Self {
        Self::InvalidState { operation }
    }

    /// Creates an inconsistent configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Returns true if this error reports a caller-side argument problem.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. } | Self::StreamIndexOutOfBounds { .. }
        )
    }
}
