//! Tracked calls: retry-aware wrappers around one transport call.
//!
//! A [`TrackedCall`] owns its primary transport call and, once the registry
//! retries it, the clone currently in flight. Outcomes are routed through
//! [`completion`] which resolves races between completion, cancellation and
//! the optional callback executor so that exactly one callback event fires
//! per enqueue.

mod callback;
mod completion;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::executor::CallbackExecutor;
use crate::retry::{CallError, RetryRegistry};
use crate::transport::{Call, Request};

pub use callback::Callback;

use completion::{Completion, Delivery};

/// Stable identity of a tracked call; the registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallId(u64);

impl CallId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        CallId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call#{}", self.0)
    }
}

struct Shared<C: Call> {
    id: CallId,
    delegate: C,
    /// Clone issued by the most recent retry; cancelled along with the primary.
    in_flight_retry: Mutex<Option<Arc<C>>>,
    enqueued: AtomicBool,
    registry: RetryRegistry,
    executor: Option<Arc<dyn CallbackExecutor>>,
}

/// Retry-aware wrapper around one transport call.
///
/// Obtained from [`crate::RetryableCalls::adapt`]. I/O-class failures register
/// the call in its [`RetryRegistry`]; a later `retry_all` re-issues a fresh
/// clone of the transport call and reports to the same callback.
pub struct TrackedCall<C: Call> {
    shared: Arc<Shared<C>>,
}

impl<C: Call> TrackedCall<C> {
    pub(crate) fn new(
        delegate: C,
        registry: RetryRegistry,
        executor: Option<Arc<dyn CallbackExecutor>>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                id: CallId::next(),
                delegate,
                in_flight_retry: Mutex::new(None),
                enqueued: AtomicBool::new(false),
                registry,
                executor,
            }),
        }
    }

    /// Another handle to the same call (same id and state).
    pub(crate) fn share(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn id(&self) -> CallId {
        self.shared.id
    }

    /// Issue the call. Returns immediately; `callback` receives exactly one
    /// event for this enqueue, and later the outcome of any retry.
    ///
    /// A second enqueue delivers [`CallError::AlreadyExecuted`]; an enqueue
    /// after [`TrackedCall::cancel`] delivers the cancellation error without
    /// touching the transport.
    pub fn enqueue<B>(&self, callback: B)
    where
        B: Callback<C> + 'static,
    {
        let completion = Completion::new(self.share(), Arc::new(callback));
        if self.shared.enqueued.swap(true, Ordering::AcqRel) {
            tracing::debug!(call_id = %self.id(), "enqueue on an already executed call");
            completion.dispatch(Delivery::Failure(CallError::AlreadyExecuted));
            return;
        }
        if self.shared.delegate.is_canceled() {
            completion.dispatch(Delivery::Failure(CallError::canceled()));
            return;
        }
        self.shared.delegate.enqueue(Box::new(completion));
    }

    /// Re-issue a fresh clone of the primary call. Only the registry calls this.
    pub(crate) fn retry(&self, callback: Arc<dyn Callback<C>>) {
        let clone = Arc::new(self.shared.delegate.clone_call());
        *self.shared.in_flight_retry.lock() = Some(Arc::clone(&clone));
        // A cancel that read the slot before the store above has already
        // marked the primary; catch it here.
        if self.shared.delegate.is_canceled() {
            clone.cancel();
        }
        tracing::debug!(call_id = %self.id(), url = %self.request().url, "re-issuing call");
        clone.enqueue(Box::new(Completion::new(self.share(), callback)));
    }

    /// Cancel the call and any retry in flight, and drop its registry entry.
    /// Idempotent; the eventual delivery for an in-flight attempt is a failure.
    pub fn cancel(&self) {
        // Mark first: a completion registering concurrently re-checks this
        // under the registry lock.
        self.shared.delegate.cancel();
        self.shared.registry.remove(self.id());
        let retry = self.shared.in_flight_retry.lock().clone();
        if let Some(retry) = retry {
            retry.cancel();
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.shared.delegate.is_canceled()
    }

    /// True once `enqueue` has been called on this call.
    pub fn is_executed(&self) -> bool {
        self.shared.enqueued.load(Ordering::Acquire) || self.shared.delegate.is_executed()
    }

    /// A new, never-executed tracked call for the same request, bound to the
    /// same registry and executor.
    pub fn clone_call(&self) -> Self {
        Self::new(
            self.shared.delegate.clone_call(),
            self.shared.registry.clone(),
            self.shared.executor.clone(),
        )
    }

    pub fn request(&self) -> &Request {
        self.shared.delegate.request()
    }

    pub(crate) fn registry(&self) -> &RetryRegistry {
        &self.shared.registry
    }

    pub(crate) fn executor(&self) -> Option<&Arc<dyn CallbackExecutor>> {
        self.shared.executor.as_ref()
    }
}

impl<C: Call> fmt::Debug for TrackedCall<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let request = self.request();
        f.debug_struct("TrackedCall")
            .field("id", &self.id())
            .field("method", &request.method)
            .field("url", &request.url.as_str())
            .field("canceled", &self.is_canceled())
            .finish()
    }
}
