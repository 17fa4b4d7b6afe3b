//! TCP reachability probe used as a connectivity source.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::Connectivity;

/// Periodically connects to `addr` and publishes state changes.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: String,
    interval: Duration,
    connect_timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>, interval: Duration) -> Self {
        let interval = interval.max(Duration::from_millis(100));
        Self {
            addr: addr.into(),
            interval,
            connect_timeout: interval.min(Duration::from_secs(5)),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// One reachability check.
    pub async fn check(&self) -> Connectivity {
        match tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_)) => Connectivity::Connected,
            Ok(Err(e)) => {
                tracing::trace!(addr = %self.addr, "probe failed: {}", e);
                Connectivity::Disconnected
            }
            Err(_) => Connectivity::Disconnected,
        }
    }

    /// Start probing on the current runtime. The receiver starts at
    /// `initial` and only sees a new value when the probed state changes.
    /// The task ends once every receiver is dropped.
    pub fn spawn(self, initial: Connectivity) -> (watch::Receiver<Connectivity>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(initial);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = tx.closed() => break,
                }
                let state = self.check().await;
                tx.send_if_modified(|current| {
                    if *current == state {
                        false
                    } else {
                        tracing::debug!(addr = %self.addr, ?state, "connectivity changed");
                        *current = state;
                        true
                    }
                });
            }
        });
        (rx, handle)
    }
}
