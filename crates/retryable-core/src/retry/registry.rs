//! Registry of calls that failed with a retryable error.
//!
//! One mutex guards the ordered entry list. Every operation holds it only
//! long enough to mutate or snapshot the list; re-enqueueing calls and
//! dropping removed entries happen after the guard is released, so callbacks
//! may call back into the registry (e.g. `retry_all` from a callback).

use std::sync::Arc;

use parking_lot::Mutex;

use crate::call::{Callback, CallId, TrackedCall};
use crate::transport::Call;

/// A registered call, type-erased so one registry serves every response type.
pub(crate) trait PendingRetry: Send {
    fn id(&self) -> CallId;

    /// Re-issue the call with its registered callback.
    fn retry(self: Box<Self>);
}

struct Pending<C: Call> {
    call: TrackedCall<C>,
    callback: Arc<dyn Callback<C>>,
}

impl<C: Call> PendingRetry for Pending<C> {
    fn id(&self) -> CallId {
        self.call.id()
    }

    fn retry(self: Box<Self>) {
        let Pending { call, callback } = *self;
        call.retry(callback);
    }
}

type Entries = Vec<Box<dyn PendingRetry>>;

/// Thread-safe, insertion-ordered map from a failed call to the callback
/// that should receive the outcome of its retry.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct RetryRegistry {
    entries: Arc<Mutex<Entries>>,
}

impl RetryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `call` for the next bulk retry, replacing any callback
    /// already registered for it (the entry keeps its original position).
    pub fn add<C: Call>(&self, call: &TrackedCall<C>, callback: Arc<dyn Callback<C>>) {
        let pending: Box<dyn PendingRetry> = Box::new(Pending {
            call: call.share(),
            callback,
        });
        let replaced = {
            let mut entries = self.entries.lock();
            upsert(&mut entries, pending)
        };
        tracing::debug!(call_id = %call.id(), replaced = replaced.is_some(), "registered call for retry");
    }

    /// Like [`RetryRegistry::add`], but skips the insert if `call` is cancelled
    /// when checked inside the critical section. Returns whether it was added.
    ///
    /// `TrackedCall::cancel` marks the call cancelled before removing its entry,
    /// so either this check sees the cancel or the cancel's removal runs after
    /// the insert. A cancelled call is never left registered.
    pub(crate) fn add_unless_canceled<C: Call>(
        &self,
        call: &TrackedCall<C>,
        callback: Arc<dyn Callback<C>>,
    ) -> bool {
        let pending: Box<dyn PendingRetry> = Box::new(Pending {
            call: call.share(),
            callback,
        });
        let (added, _replaced) = {
            let mut entries = self.entries.lock();
            if call.is_canceled() {
                (false, Some(pending))
            } else {
                (true, upsert(&mut entries, pending))
            }
        };
        if added {
            tracing::debug!(call_id = %call.id(), "registered call for retry");
        } else {
            tracing::debug!(call_id = %call.id(), "call canceled, not registered for retry");
        }
        added
    }

    /// Remove the entry for `id`, if any. Returns whether an entry was removed.
    pub fn remove(&self, id: CallId) -> bool {
        let removed = {
            let mut entries = self.entries.lock();
            entries
                .iter()
                .position(|p| p.id() == id)
                .map(|pos| entries.remove(pos))
        };
        if removed.is_some() {
            tracing::debug!(call_id = %id, "removed call from retry registry");
        }
        removed.is_some()
    }

    /// Snapshot and clear all entries in one critical section, then re-issue
    /// each snapshotted call in insertion order. Calls that register while
    /// this runs stay registered for the next trigger.
    ///
    /// Returns the number of calls re-issued.
    pub fn retry_all(&self) -> usize {
        let snapshot = std::mem::take(&mut *self.entries.lock());
        let count = snapshot.len();
        if count > 0 {
            tracing::debug!(count, "retrying pending calls");
        }
        for pending in snapshot {
            pending.retry();
        }
        count
    }

    /// Drop every entry without retrying it.
    pub fn clear(&self) {
        let dropped = std::mem::take(&mut *self.entries.lock());
        if !dropped.is_empty() {
            tracing::debug!(count = dropped.len(), "cleared pending calls");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn contains(&self, id: CallId) -> bool {
        self.entries.lock().iter().any(|p| p.id() == id)
    }

    /// Registered call ids in retry order.
    pub fn pending_ids(&self) -> Vec<CallId> {
        self.entries.lock().iter().map(|p| p.id()).collect()
    }
}

impl std::fmt::Debug for RetryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryRegistry")
            .field("pending", &self.pending_ids())
            .finish()
    }
}

/// Insert or replace in place; returns the replaced entry so the caller can
/// drop it after releasing the lock.
fn upsert(entries: &mut Entries, pending: Box<dyn PendingRetry>) -> Option<Box<dyn PendingRetry>> {
    let id = pending.id();
    match entries.iter_mut().find(|p| p.id() == id) {
        Some(slot) => Some(std::mem::replace(slot, pending)),
        None => {
            entries.push(pending);
            None
        }
    }
}
