//! Caller-facing callback contract.

use std::io;
use std::sync::Arc;

use super::TrackedCall;
use crate::retry::CallError;
use crate::transport::Call;

/// Receives exactly one event per enqueue of a [`TrackedCall`].
///
/// After `on_failure_but_can_retry`, the same callback receives the outcome
/// of the retry once the registry re-issues the call.
pub trait Callback<C: Call>: Send + Sync {
    /// The transport produced a response.
    fn on_response(&self, call: &TrackedCall<C>, response: C::Response);

    /// Terminal failure, or any failure once the call was cancelled.
    fn on_failure(&self, call: &TrackedCall<C>, error: CallError);

    /// I/O-class failure; the call is registered for the next bulk retry.
    fn on_failure_but_can_retry(&self, call: &TrackedCall<C>, error: io::Error);
}

impl<C: Call, T: Callback<C> + ?Sized> Callback<C> for Arc<T> {
    fn on_response(&self, call: &TrackedCall<C>, response: C::Response) {
        (**self).on_response(call, response)
    }

    fn on_failure(&self, call: &TrackedCall<C>, error: CallError) {
        (**self).on_failure(call, error)
    }

    fn on_failure_but_can_retry(&self, call: &TrackedCall<C>, error: io::Error) {
        (**self).on_failure_but_can_retry(call, error)
    }
}
