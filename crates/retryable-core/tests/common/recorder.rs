//! Callback that records every event it receives.

use std::io;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use retryable_core::transport::http::HttpResponse;
use retryable_core::{Call, CallError, Callback, TrackedCall};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Response(String),
    Failure {
        message: String,
        io: bool,
        call_canceled: bool,
    },
    Retryable(String),
}

impl Event {
    pub fn is_canceled_failure(&self) -> bool {
        matches!(self, Event::Failure { message, io: true, .. } if message == "Canceled")
    }
}

/// How a response is rendered into an [`Event::Response`].
pub trait Describe {
    fn describe(self) -> String;
}

impl Describe for String {
    fn describe(self) -> String {
        self
    }
}

impl Describe for HttpResponse {
    fn describe(self) -> String {
        format!("{} {}", self.status, self.text())
    }
}

#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
    changed: Condvar,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Block until at least `n` events arrived; false on timeout.
    pub fn wait_for(&self, n: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut events = self.events.lock().unwrap();
        while events.len() < n {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            events = self.changed.wait_timeout(events, deadline - now).unwrap().0;
        }
        true
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
        self.changed.notify_all();
    }
}

impl<C> Callback<C> for Recorder
where
    C: Call,
    C::Response: Describe,
{
    fn on_response(&self, _call: &TrackedCall<C>, response: C::Response) {
        self.push(Event::Response(response.describe()));
    }

    fn on_failure(&self, call: &TrackedCall<C>, error: CallError) {
        self.push(Event::Failure {
            message: error.to_string(),
            io: error.as_io().is_some(),
            call_canceled: call.is_canceled(),
        });
    }

    fn on_failure_but_can_retry(&self, _call: &TrackedCall<C>, error: io::Error) {
        self.push(Event::Retryable(error.to_string()));
    }
}
