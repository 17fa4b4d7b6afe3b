//! Completion path of a tracked call: decides which callback event fires.
//!
//! | outcome   | cancelled at completion | cancelled at dispatch | delivered                     |
//! |-----------|-------------------------|-----------------------|-------------------------------|
//! | response  | no                      | no                    | `on_response`                 |
//! | response  | no                      | yes                   | `on_failure(Canceled)`        |
//! | response  | yes                     | -                     | `on_failure(Canceled)`        |
//! | terminal  | any                     | -                     | `on_failure(error)`           |
//! | I/O       | no                      | no                    | `on_failure_but_can_retry`    |
//! | I/O       | no                      | yes                   | `on_failure(error)`           |
//! | I/O       | yes                     | -                     | `on_failure(error)`           |
//!
//! The dispatch-time check only exists when a callback executor is set.
//! A terminal error is never masked by cancellation.

use std::io;
use std::sync::Arc;

use super::{Callback, TrackedCall};
use crate::retry::{into_retryable, CallError};
use crate::transport::{Call, CompletionHandler};

/// Event about to be handed to the user callback.
pub(crate) enum Delivery<T> {
    Response(T),
    Failure(CallError),
    RetryableFailure(io::Error),
}

impl<T> Delivery<T> {
    /// Downgrade for a call cancelled between completion and dispatch.
    fn canceled(self) -> Self {
        match self {
            Delivery::Response(_) => Delivery::Failure(CallError::canceled()),
            Delivery::RetryableFailure(e) => Delivery::Failure(CallError::Io(e)),
            failure @ Delivery::Failure(_) => failure,
        }
    }

    fn is_failure(&self) -> bool {
        matches!(self, Delivery::Failure(_))
    }
}

/// Per-attempt state carried into the transport's completion path.
pub(crate) struct Completion<C: Call> {
    call: TrackedCall<C>,
    callback: Arc<dyn Callback<C>>,
}

impl<C: Call> CompletionHandler<C::Response> for Completion<C> {
    fn complete(self: Box<Self>, outcome: Result<C::Response, CallError>) {
        self.resolve(outcome);
    }
}

impl<C: Call> Completion<C> {
    pub(crate) fn new(call: TrackedCall<C>, callback: Arc<dyn Callback<C>>) -> Self {
        Self { call, callback }
    }

    fn resolve(self, outcome: Result<C::Response, CallError>) {
        let registry = self.call.registry().clone();
        let canceled = self.call.is_canceled();
        match outcome {
            Ok(response) => {
                registry.remove(self.call.id());
                if canceled {
                    self.dispatch(Delivery::Failure(CallError::canceled()));
                } else {
                    self.dispatch(Delivery::Response(response));
                }
            }
            Err(error) if canceled => self.dispatch(Delivery::Failure(error)),
            Err(error) => match into_retryable(error) {
                Ok(io) => {
                    if registry.add_unless_canceled(&self.call, Arc::clone(&self.callback)) {
                        self.dispatch(Delivery::RetryableFailure(io));
                    } else {
                        self.dispatch(Delivery::Failure(CallError::Io(io)));
                    }
                }
                Err(terminal) => {
                    registry.remove(self.call.id());
                    self.dispatch(Delivery::Failure(terminal));
                }
            },
        }
    }

    /// Hand the event to the callback, through the executor if one is set.
    pub(crate) fn dispatch(self, delivery: Delivery<C::Response>) {
        match self.call.executor().cloned() {
            None => self.deliver(delivery),
            Some(executor) => executor.execute(Box::new(move || {
                let delivery = if !delivery.is_failure() && self.call.is_canceled() {
                    tracing::debug!(
                        call_id = %self.call.id(),
                        "call canceled before dispatch; delivering failure"
                    );
                    delivery.canceled()
                } else {
                    delivery
                };
                self.deliver(delivery);
            })),
        }
    }

    fn deliver(self, delivery: Delivery<C::Response>) {
        match delivery {
            Delivery::Response(response) => self.callback.on_response(&self.call, response),
            Delivery::Failure(error) => self.callback.on_failure(&self.call, error),
            Delivery::RetryableFailure(error) => {
                self.callback.on_failure_but_can_retry(&self.call, error)
            }
        }
    }
}
