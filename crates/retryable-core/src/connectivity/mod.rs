//! Connectivity-driven bulk retry.
//!
//! A connectivity source publishes [`Connectivity`] states on a
//! `tokio::sync::watch` channel; [`AutoRetryer`] listens and calls
//! [`RetryRegistry::retry_all`] every time the state becomes `Connected`.
//! [`TcpProbe`] is a portable source that tries a TCP connect periodically.

mod probe;

pub use probe::TcpProbe;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::retry::RetryRegistry;

/// Whether the network is believed to be reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Connected,
    Disconnected,
}

/// Retries every pending call when connectivity is restored.
#[derive(Debug)]
pub struct AutoRetryer {
    registry: RetryRegistry,
    events: watch::Receiver<Connectivity>,
    task: Option<JoinHandle<()>>,
}

impl AutoRetryer {
    pub fn new(registry: RetryRegistry, events: watch::Receiver<Connectivity>) -> Self {
        Self {
            registry,
            events,
            task: None,
        }
    }

    /// Start listening on the current tokio runtime. No-op if already registered.
    pub fn register(&mut self) -> Result<()> {
        if self.is_registered() {
            return Ok(());
        }
        let handle = tokio::runtime::Handle::try_current()
            .context("auto-retryer needs a tokio runtime")?;
        let registry = self.registry.clone();
        let mut events = self.events.clone();
        // Only changes published from now on trigger a retry.
        let _ = events.borrow_and_update();
        self.task = Some(handle.spawn(async move {
            while events.changed().await.is_ok() {
                let state = *events.borrow_and_update();
                if state == Connectivity::Connected {
                    let count = registry.retry_all();
                    tracing::info!(count, "connectivity restored; retried pending calls");
                } else {
                    tracing::info!("connectivity lost");
                }
            }
            tracing::debug!("connectivity source closed; auto-retryer stopped");
        }));
        Ok(())
    }

    /// Stop listening. Pending calls stay registered.
    pub fn unregister(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_registered(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for AutoRetryer {
    fn drop(&mut self) {
        self.unregister();
    }
}
