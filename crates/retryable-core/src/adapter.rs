//! Adaptation layer: turns transport calls into tracked calls.

use std::sync::Arc;

use crate::call::TrackedCall;
use crate::executor::CallbackExecutor;
use crate::retry::RetryRegistry;
use crate::transport::Call;

/// Factory binding transport calls to a retry registry and an optional
/// callback executor.
///
/// Also the entry point for whatever decides that connectivity is back:
/// [`RetryableCalls::retry_all_calls`] and [`RetryableCalls::clear_calls`].
#[derive(Clone, Default)]
pub struct RetryableCalls {
    registry: RetryRegistry,
    executor: Option<Arc<dyn CallbackExecutor>>,
}

impl RetryableCalls {
    /// Fresh registry, callbacks run inline.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> RetryableCallsBuilder {
        RetryableCallsBuilder::default()
    }

    /// Wrap a transport call. The call is not enqueued.
    pub fn adapt<C: Call>(&self, call: C) -> TrackedCall<C> {
        TrackedCall::new(call, self.registry.clone(), self.executor.clone())
    }

    pub fn registry(&self) -> &RetryRegistry {
        &self.registry
    }

    pub fn callback_executor(&self) -> Option<&Arc<dyn CallbackExecutor>> {
        self.executor.as_ref()
    }

    /// Re-issue every pending call. Returns how many were re-issued.
    pub fn retry_all_calls(&self) -> usize {
        self.registry.retry_all()
    }

    /// Forget every pending call without retrying it.
    pub fn clear_calls(&self) {
        self.registry.clear();
    }
}

impl std::fmt::Debug for RetryableCalls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryableCalls")
            .field("registry", &self.registry)
            .field("callback_executor", &self.executor.is_some())
            .finish()
    }
}

/// Builder for [`RetryableCalls`].
#[derive(Default)]
pub struct RetryableCallsBuilder {
    registry: Option<RetryRegistry>,
    executor: Option<Arc<dyn CallbackExecutor>>,
}

impl RetryableCallsBuilder {
    /// Share an existing registry (e.g. between factories for different services).
    pub fn registry(mut self, registry: RetryRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Deliver callbacks through `executor` instead of inline.
    pub fn callback_executor(mut self, executor: Arc<dyn CallbackExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn build(self) -> RetryableCalls {
        RetryableCalls {
            registry: self.registry.unwrap_or_default(),
            executor: self.executor,
        }
    }
}
