//! Minimal scripted HTTP/1.1 server for transport tests.
//!
//! Each accepted connection consumes the next scripted action.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Action {
    /// Close the connection without answering (client sees an empty reply).
    Drop,
    /// Answer with the given status and body.
    Respond(u16, &'static str),
    /// Read the request, then hold the connection open without answering.
    Stall(Duration),
}

/// Starts a server in a background thread. Returns the base URL
/// (e.g. "http://127.0.0.1:12345/"). Runs until the process exits.
pub fn start(actions: Vec<Action>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let actions = Arc::new(Mutex::new(VecDeque::from(actions)));
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let action = actions
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Action::Respond(404, "unscripted"));
            thread::spawn(move || handle(stream, action));
        }
    });
    format!("http://127.0.0.1:{}/", port)
}

/// A URL on a port nothing listens on.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/", port)
}

fn handle(mut stream: TcpStream, action: Action) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let _ = stream.read(&mut buf);
    match action {
        Action::Drop => {}
        Action::Respond(status, body) => {
            let response = format!(
                "HTTP/1.1 {} X\r\nContent-Length: {}\r\nContent-Type: text/plain\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
        Action::Stall(d) => thread::sleep(d),
    }
}
