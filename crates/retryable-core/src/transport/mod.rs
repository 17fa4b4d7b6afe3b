//! Contract with the transport that actually performs network calls.
//!
//! The retry bookkeeping never talks to the network itself. It wraps any
//! type implementing [`Call`]: something that can be enqueued once, cancelled,
//! cloned into a fresh attempt, and that reports its outcome exactly once
//! through a [`CompletionHandler`]. [`http::HttpCall`] is the curl-backed
//! implementation shipped with this crate.

pub mod http;
mod request;

pub use request::Request;

use crate::retry::CallError;

/// Receives the outcome of one underlying call attempt.
///
/// Consumed by value, so a transport can only ever complete it once.
pub trait CompletionHandler<T>: Send {
    fn complete(self: Box<Self>, outcome: Result<T, CallError>);
}

/// One asynchronous network call as provided by a transport.
///
/// Implementations must:
/// - invoke the handler passed to [`Call::enqueue`] exactly once, from any thread;
/// - still invoke it (with [`CallError::canceled`]) when enqueued after `cancel`;
/// - keep `cancel` idempotent and `is_canceled` true once it has been called;
/// - make `clone_call` produce an independent, not-yet-executed call for the same request.
pub trait Call: Send + Sync + 'static {
    type Response: Send + 'static;

    /// Start the call; returns immediately.
    fn enqueue(&self, handler: Box<dyn CompletionHandler<Self::Response>>);

    fn cancel(&self);

    fn is_canceled(&self) -> bool;

    fn is_executed(&self) -> bool;

    /// A fresh call for the same request.
    fn clone_call(&self) -> Self
    where
        Self: Sized;

    /// The outbound request; available before the call is enqueued.
    fn request(&self) -> &Request;
}
