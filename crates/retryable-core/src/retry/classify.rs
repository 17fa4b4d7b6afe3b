//! Classify call failures into retryable (I/O-class) and terminal.

use std::io;

use super::error::CallError;

/// Retry classification of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient, network-level failure. The call is kept for bulk retry.
    Retryable,
    /// Any other failure. Delivered once and never retried.
    Terminal,
}

/// Classify a call error. Only I/O-class failures are retryable.
pub fn classify(e: &CallError) -> ErrorClass {
    match e {
        CallError::Io(_) => ErrorClass::Retryable,
        CallError::AlreadyExecuted | CallError::Other(_) => ErrorClass::Terminal,
    }
}

/// Split an error into its retryable I/O part or hand it back unchanged.
pub(crate) fn into_retryable(e: CallError) -> Result<io::Error, CallError> {
    match (classify(&e), e) {
        (ErrorClass::Retryable, CallError::Io(io)) => Ok(io),
        (_, other) => Err(other),
    }
}
