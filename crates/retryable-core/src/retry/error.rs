//! Error type delivered to callbacks when a call does not produce a response.

use std::io;

/// Message carried by the synthetic I/O error reported for cancelled calls.
pub const CANCELED_MESSAGE: &str = "Canceled";

/// Failure outcome of a single call attempt.
///
/// The transport decides which variant it produces; the retry bookkeeping
/// only cares whether the failure is I/O-class (see [`super::classify`]).
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// Transport-level failure: connection reset, timeout, DNS, etc.
    /// Also used for the synthetic cancellation error.
    #[error("{0}")]
    Io(#[from] io::Error),
    /// `enqueue` was invoked on a call that had already been enqueued.
    #[error("call already executed")]
    AlreadyExecuted,
    /// Anything else (decoding failures, application-level errors). Never retried.
    #[error("{0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl CallError {
    /// The error reported for a call that was cancelled.
    pub fn canceled() -> Self {
        CallError::Io(io::Error::new(io::ErrorKind::Interrupted, CANCELED_MESSAGE))
    }

    /// Wrap an arbitrary terminal error.
    pub fn other<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        CallError::Other(error.into())
    }

    /// True if this is the synthetic error produced by [`CallError::canceled`].
    pub fn is_canceled_marker(&self) -> bool {
        match self {
            CallError::Io(e) => {
                e.kind() == io::ErrorKind::Interrupted && e.to_string() == CANCELED_MESSAGE
            }
            _ => false,
        }
    }

    /// The underlying I/O error, if this failure is I/O-class.
    pub fn as_io(&self) -> Option<&io::Error> {
        match self {
            CallError::Io(e) => Some(e),
            _ => None,
        }
    }
}
