//! Retry bookkeeping.
//!
//! Failure classification (I/O-class failures are retryable, everything else
//! is terminal), the error type delivered to callbacks, and the registry that
//! remembers calls waiting for a bulk retry.

mod classify;
mod error;
mod registry;

pub use classify::{classify, ErrorClass};
pub use error::{CallError, CANCELED_MESSAGE};
pub use registry::RetryRegistry;

pub(crate) use classify::into_retryable;
