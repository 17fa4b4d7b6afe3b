//! `retryable fetch <URL>...` – fetch URLs; I/O failures wait for connectivity.

use anyhow::{Context, Result};
use retryable_core::config::{CallbackExecutorKind, RetryableConfig};
use retryable_core::connectivity::{AutoRetryer, TcpProbe};
use retryable_core::control::{self, ControlCommand};
use retryable_core::transport::http::{HttpCall, HttpResponse};
use retryable_core::{
    CallError, CallId, Callback, DedicatedThread, Request, RetryableCalls, TrackedCall,
};
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::cli::control_socket;

#[derive(Debug)]
pub struct FetchArgs {
    pub urls: Vec<String>,
    pub headers: Vec<String>,
    /// Run the TCP connectivity probe (if configured).
    pub probe: bool,
}

/// One callback event, forwarded to the command loop.
#[derive(Debug)]
enum Report {
    Done(CallId, HttpResponse),
    Failed(CallId, CallError),
    Waiting(CallId, io::Error),
}

/// Callback that forwards every event to the command loop.
struct Reporter {
    tx: mpsc::UnboundedSender<Report>,
}

impl Callback<HttpCall> for Reporter {
    fn on_response(&self, call: &TrackedCall<HttpCall>, response: HttpResponse) {
        let _ = self.tx.send(Report::Done(call.id(), response));
    }

    fn on_failure(&self, call: &TrackedCall<HttpCall>, error: CallError) {
        let _ = self.tx.send(Report::Failed(call.id(), error));
    }

    fn on_failure_but_can_retry(&self, call: &TrackedCall<HttpCall>, error: io::Error) {
        let _ = self.tx.send(Report::Waiting(call.id(), error));
    }
}

struct Tracked {
    call: TrackedCall<HttpCall>,
    url: String,
}

fn build_requests(args: &FetchArgs) -> Result<Vec<Request>> {
    args.urls
        .iter()
        .map(|url| {
            let mut request = Request::get(url)?;
            for header in &args.headers {
                request = request.with_raw_header(header)?;
            }
            Ok(request)
        })
        .collect()
}

fn build_calls(cfg: &RetryableConfig) -> Result<RetryableCalls> {
    let builder = RetryableCalls::builder();
    let builder = match cfg.callback_executor_kind() {
        CallbackExecutorKind::Inline => builder,
        CallbackExecutorKind::Dedicated => {
            let thread = DedicatedThread::spawn("retryable-callbacks")
                .context("spawning callback thread")?;
            builder.callback_executor(Arc::new(thread))
        }
    };
    Ok(builder.build())
}

pub async fn run_fetch(cfg: &RetryableConfig, args: FetchArgs) -> Result<()> {
    let requests = build_requests(&args)?;
    let calls = build_calls(cfg)?;
    let options = cfg.http_options();

    let (control_tx, mut control_rx) = mpsc::unbounded_channel::<ControlCommand>();
    let socket_path = control::default_control_socket_path().ok();
    let listener = socket_path.as_ref().and_then(|path| {
        match control_socket::spawn_control_listener(path, control_tx) {
            Ok(handle) => {
                tracing::debug!(path = %path.display(), "control socket listening");
                Some(handle)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "control socket unavailable: {}", e);
                None
            }
        }
    });

    let mut auto_retryer = None;
    if let (true, Some(conn)) = (args.probe, cfg.connectivity.as_ref()) {
        let probe = TcpProbe::new(conn.probe_addr.clone(), conn.probe_interval());
        let initial = probe.check().await;
        let (events, _probe_task) = probe.spawn(initial);
        let mut retryer = AutoRetryer::new(calls.registry().clone(), events);
        retryer.register()?;
        tracing::debug!(addr = %conn.probe_addr, ?initial, "connectivity probe started");
        auto_retryer = Some(retryer);
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<Report>();
    let reporter = Arc::new(Reporter { tx });
    let mut outstanding: HashMap<CallId, Tracked> = HashMap::new();
    for request in requests {
        let url = request.url.to_string();
        let call = calls.adapt(HttpCall::new(request, options));
        call.enqueue(Arc::clone(&reporter));
        tracing::info!(id = %call.id(), %url, "fetch started");
        outstanding.insert(
            call.id(),
            Tracked { call, url },
        );
    }
    drop(reporter);

    let mut failures = 0usize;
    let mut interrupted = false;
    while !outstanding.is_empty() {
        tokio::select! {
            Some(report) = rx.recv() => match report {
                Report::Done(id, response) => {
                    if let Some(t) = outstanding.remove(&id) {
                        println!("{} {} ({} bytes)", response.status, t.url, response.body.len());
                        if !response.is_success() {
                            failures += 1;
                        }
                    }
                }
                Report::Failed(id, error) => {
                    if let Some(t) = outstanding.remove(&id) {
                        eprintln!("failed {}: {}", t.url, error);
                        failures += 1;
                    }
                }
                Report::Waiting(id, error) => {
                    if let Some(t) = outstanding.get(&id) {
                        eprintln!("waiting {}: {} (retry pending)", t.url, error);
                    }
                }
            },
            Some(cmd) = control_rx.recv() => match cmd {
                ControlCommand::Retry => {
                    let count = cmd.apply(calls.registry());
                    tracing::info!(count, "retry requested over control socket");
                }
                ControlCommand::Clear => {
                    // Remove one by one so only calls actually dropped are reported.
                    for id in calls.registry().pending_ids() {
                        if calls.registry().remove(id) {
                            if let Some(t) = outstanding.remove(&id) {
                                eprintln!("dropped {}", t.url);
                                failures += 1;
                            }
                        }
                    }
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(count = outstanding.len(), "interrupted; cancelling calls");
                for t in outstanding.values() {
                    t.call.cancel();
                }
                interrupted = true;
                break;
            }
        }
    }

    if let Some(mut retryer) = auto_retryer {
        retryer.unregister();
    }
    calls.clear_calls();
    if let Some(handle) = listener {
        handle.abort();
    }
    if let Some(path) = socket_path {
        let _ = std::fs::remove_file(path);
    }

    if interrupted {
        anyhow::bail!("interrupted with {} call(s) outstanding", outstanding.len());
    }
    if failures > 0 {
        anyhow::bail!("{} of {} fetch(es) failed", failures, args.urls.len());
    }
    Ok(())
}
