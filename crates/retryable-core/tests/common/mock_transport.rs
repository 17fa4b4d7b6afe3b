//! Scripted in-memory transport.
//!
//! Replies are consumed in FIFO order across every call made against the
//! server, like a mock web server. Three completion modes:
//! - inline: the handler runs inside `enqueue`;
//! - parking: enqueued calls wait until the test releases them;
//! - threaded: each enqueue completes on a fresh thread.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use retryable_core::transport::{Call, CompletionHandler, Request};
use retryable_core::CallError;

/// One scripted outcome.
#[derive(Debug, Clone)]
pub enum Reply {
    Body(&'static str),
    IoError(&'static str),
    Broken(&'static str),
}

impl Reply {
    fn into_outcome(self) -> Result<String, CallError> {
        match self {
            Reply::Body(b) => Ok(b.to_string()),
            Reply::IoError(m) => Err(io::Error::new(io::ErrorKind::ConnectionReset, m).into()),
            Reply::Broken(m) => Err(CallError::other(m)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Inline,
    Parking,
    Threaded,
}

struct Parked {
    handler: Box<dyn CompletionHandler<String>>,
    canceled: Arc<AtomicBool>,
}

pub struct MockServer {
    mode: Mode,
    replies: Mutex<VecDeque<Reply>>,
    fallback: Mutex<Option<Reply>>,
    parked: Mutex<VecDeque<Parked>>,
    requests: AtomicUsize,
    paths: Mutex<Vec<String>>,
}

impl MockServer {
    fn with_mode(mode: Mode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            replies: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(None),
            parked: Mutex::new(VecDeque::new()),
            requests: AtomicUsize::new(0),
            paths: Mutex::new(Vec::new()),
        })
    }

    pub fn new() -> Arc<Self> {
        Self::with_mode(Mode::Inline)
    }

    pub fn parking() -> Arc<Self> {
        Self::with_mode(Mode::Parking)
    }

    pub fn threaded() -> Arc<Self> {
        Self::with_mode(Mode::Threaded)
    }

    pub fn enqueue(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Reply used once the script is exhausted.
    pub fn always(&self, reply: Reply) {
        *self.fallback.lock().unwrap() = Some(reply);
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Paths of every request that reached the server, in order.
    pub fn requested_paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }

    pub fn parked_count(&self) -> usize {
        self.parked.lock().unwrap().len()
    }

    /// A call for `/`.
    pub fn call(self: &Arc<Self>) -> MockCall {
        self.call_to("/")
    }

    pub fn call_to(self: &Arc<Self>, path: &str) -> MockCall {
        let request = Request::get(&format!("http://mock.test{path}")).unwrap();
        MockCall::new(Arc::clone(self), request)
    }

    fn next_reply(&self) -> Reply {
        let scripted = self.replies.lock().unwrap().pop_front();
        scripted
            .or_else(|| self.fallback.lock().unwrap().clone())
            .unwrap_or(Reply::IoError("no scripted reply"))
    }

    /// The transport's own view of an in-flight call: cancelled calls fail
    /// with the cancellation error.
    fn respond(&self, canceled: &AtomicBool) -> Result<String, CallError> {
        if canceled.load(Ordering::SeqCst) {
            return Err(CallError::canceled());
        }
        self.next_reply().into_outcome()
    }

    /// Complete the oldest parked call with the next scripted reply.
    pub fn release_next(&self) -> bool {
        let Some(parked) = self.parked.lock().unwrap().pop_front() else {
            return false;
        };
        let outcome = self.respond(&parked.canceled);
        parked.handler.complete(outcome);
        true
    }

    /// Complete the oldest parked call with `reply`, even if it was cancelled
    /// (the outcome was produced before the cancel landed).
    pub fn release_next_with(&self, reply: Reply) -> bool {
        let Some(parked) = self.parked.lock().unwrap().pop_front() else {
            return false;
        };
        parked.handler.complete(reply.into_outcome());
        true
    }
}

pub struct MockCall {
    server: Arc<MockServer>,
    request: Request,
    canceled: Arc<AtomicBool>,
    executed: AtomicBool,
}

impl MockCall {
    fn new(server: Arc<MockServer>, request: Request) -> Self {
        Self {
            server,
            request,
            canceled: Arc::new(AtomicBool::new(false)),
            executed: AtomicBool::new(false),
        }
    }
}

impl Call for MockCall {
    type Response = String;

    fn enqueue(&self, handler: Box<dyn CompletionHandler<String>>) {
        if self.executed.swap(true, Ordering::SeqCst) {
            handler.complete(Err(CallError::AlreadyExecuted));
            return;
        }
        if self.canceled.load(Ordering::SeqCst) {
            handler.complete(Err(CallError::canceled()));
            return;
        }
        self.server.requests.fetch_add(1, Ordering::SeqCst);
        self.server
            .paths
            .lock()
            .unwrap()
            .push(self.request.url.path().to_string());
        match self.server.mode {
            Mode::Inline => {
                let outcome = self.server.respond(&self.canceled);
                handler.complete(outcome);
            }
            Mode::Parking => self.server.parked.lock().unwrap().push_back(Parked {
                handler,
                canceled: Arc::clone(&self.canceled),
            }),
            Mode::Threaded => {
                let server = Arc::clone(&self.server);
                let canceled = Arc::clone(&self.canceled);
                thread::spawn(move || {
                    thread::yield_now();
                    let outcome = server.respond(&canceled);
                    handler.complete(outcome);
                });
            }
        }
    }

    fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    fn is_executed(&self) -> bool {
        self.executed.load(Ordering::SeqCst)
    }

    fn clone_call(&self) -> Self {
        MockCall::new(Arc::clone(&self.server), self.request.clone())
    }

    fn request(&self) -> &Request {
        &self.request
    }
}
