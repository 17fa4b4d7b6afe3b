//! curl-backed HTTP transport.
//!
//! Each enqueue runs one blocking libcurl transfer on its own thread and
//! reports the outcome through the completion handler. Cancellation is
//! cooperative: a shared flag is polled from curl's progress callback and
//! aborts the transfer.

use std::io;
use std::str;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::{Call, CompletionHandler, Request};
use crate::retry::CallError;

/// Transfer options applied to every attempt of an [`HttpCall`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub follow_redirects: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(30),
            follow_redirects: true,
        }
    }
}

/// A completed HTTP exchange. Any status code counts as a response;
/// callers decide what a non-2xx status means for them.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u32,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// First header with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Default)]
struct CallFlags {
    canceled: AtomicBool,
    executed: AtomicBool,
}

/// One HTTP call. Not executed until [`Call::enqueue`].
#[derive(Debug)]
pub struct HttpCall {
    request: Request,
    options: HttpOptions,
    flags: Arc<CallFlags>,
}

impl HttpCall {
    pub fn new(request: Request, options: HttpOptions) -> Self {
        Self {
            request,
            options,
            flags: Arc::new(CallFlags::default()),
        }
    }

    pub fn options(&self) -> HttpOptions {
        self.options
    }
}

impl Call for HttpCall {
    type Response = HttpResponse;

    fn enqueue(&self, handler: Box<dyn CompletionHandler<HttpResponse>>) {
        if self.flags.executed.swap(true, Ordering::AcqRel) {
            handler.complete(Err(CallError::AlreadyExecuted));
            return;
        }
        let request = self.request.clone();
        let options = self.options;
        let flags = Arc::clone(&self.flags);
        thread::spawn(move || {
            let outcome = perform(&request, options, &flags.canceled);
            handler.complete(outcome);
        });
    }

    fn cancel(&self) {
        self.flags.canceled.store(true, Ordering::Release);
    }

    fn is_canceled(&self) -> bool {
        self.flags.canceled.load(Ordering::Acquire)
    }

    fn is_executed(&self) -> bool {
        self.flags.executed.load(Ordering::Acquire)
    }

    fn clone_call(&self) -> Self {
        Self::new(self.request.clone(), self.options)
    }

    fn request(&self) -> &Request {
        &self.request
    }
}

/// Runs one blocking transfer. A cancel observed at any point wins over
/// whatever curl reported.
fn perform(
    request: &Request,
    options: HttpOptions,
    canceled: &AtomicBool,
) -> Result<HttpResponse, CallError> {
    if canceled.load(Ordering::Acquire) {
        return Err(CallError::canceled());
    }

    let mut easy = curl::easy::Easy::new();
    easy.url(request.url.as_str()).map_err(classify_curl_error)?;
    if request.method.eq_ignore_ascii_case("GET") {
        easy.get(true).map_err(classify_curl_error)?;
    } else {
        easy.custom_request(&request.method)
            .map_err(classify_curl_error)?;
    }
    easy.follow_location(options.follow_redirects)
        .map_err(classify_curl_error)?;
    easy.connect_timeout(options.connect_timeout)
        .map_err(classify_curl_error)?;
    easy.timeout(options.timeout).map_err(classify_curl_error)?;
    easy.progress(true).map_err(classify_curl_error)?;

    if !request.headers.is_empty() {
        let mut list = curl::easy::List::new();
        for (k, v) in &request.headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))
                .map_err(classify_curl_error)?;
        }
        easy.http_headers(list).map_err(classify_curl_error)?;
    }

    let mut body = Vec::new();
    let mut raw_headers: Vec<String> = Vec::new();
    let result = {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    raw_headers.push(s.trim_end().to_string());
                }
                true
            })
            .map_err(classify_curl_error)?;
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(classify_curl_error)?;
        transfer
            .progress_function(|_, _, _, _| !canceled.load(Ordering::Acquire))
            .map_err(classify_curl_error)?;
        transfer.perform()
    };

    if canceled.load(Ordering::Acquire) {
        return Err(CallError::canceled());
    }
    result.map_err(classify_curl_error)?;

    let status = easy.response_code().map_err(classify_curl_error)?;
    Ok(HttpResponse {
        status,
        headers: parse_header_lines(&raw_headers),
        body,
    })
}

/// Map a curl error onto the call error taxonomy: network-level failures
/// become I/O errors (retryable), everything else is terminal.
pub fn classify_curl_error(e: curl::Error) -> CallError {
    let kind = if e.is_operation_timedout() {
        Some(io::ErrorKind::TimedOut)
    } else if e.is_couldnt_connect() {
        Some(io::ErrorKind::ConnectionRefused)
    } else if e.is_couldnt_resolve_host() || e.is_couldnt_resolve_proxy() {
        Some(io::ErrorKind::NotFound)
    } else if e.is_read_error() || e.is_recv_error() || e.is_got_nothing() {
        Some(io::ErrorKind::ConnectionReset)
    } else if e.is_send_error() {
        Some(io::ErrorKind::BrokenPipe)
    } else if e.is_aborted_by_callback() {
        return CallError::canceled();
    } else {
        None
    };
    match kind {
        Some(kind) => CallError::Io(io::Error::new(kind, e)),
        None => CallError::other(e),
    }
}

/// Parse header lines of the final response; earlier responses (redirects,
/// `100 Continue`) are discarded when a new status line starts.
fn parse_header_lines(lines: &[String]) -> Vec<(String, String)> {
    let mut headers = Vec::new();
    for line in lines {
        if line.starts_with("HTTP/") {
            headers.clear();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }
    headers
}
