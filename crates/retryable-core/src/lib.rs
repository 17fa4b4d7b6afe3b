//! Retry bookkeeping for asynchronous network calls.
//!
//! Wrap transport calls with [`RetryableCalls::adapt`] to get a
//! [`TrackedCall`]. Calls failing with an I/O-class error are remembered in a
//! [`RetryRegistry`] and re-issued in bulk by [`RetryRegistry::retry_all`],
//! typically when connectivity comes back (see [`connectivity`]).

pub mod adapter;
pub mod call;
pub mod config;
pub mod connectivity;
pub mod control;
pub mod executor;
pub mod logging;
pub mod retry;
pub mod transport;

pub use adapter::{RetryableCalls, RetryableCallsBuilder};
pub use call::{CallId, Callback, TrackedCall};
pub use executor::{CallbackExecutor, DedicatedThread, Task, TokioExecutor};
pub use retry::{classify, CallError, ErrorClass, RetryRegistry};
pub use transport::{Call, CompletionHandler, Request};
