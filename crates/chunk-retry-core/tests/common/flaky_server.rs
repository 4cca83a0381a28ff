//! Minimal HTTP/1.1 server for integration tests that fails a configurable
//! number of GETs with 503 before serving a static body.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// Handle to a running server. The server runs until the process exits.
#[derive(Clone)]
pub struct FlakyServer {
    /// `127.0.0.1:<port>`, usable as a fallback domain.
    pub authority: String,
    hits: Arc<AtomicUsize>,
    paths: Arc<Mutex<Vec<String>>>,
    headers: Arc<Mutex<Vec<Vec<(String, String)>>>>,
}

impl FlakyServer {
    /// `http://127.0.0.1:<port>`, usable as an origin.
    pub fn origin(&self) -> String {
        format!("http://{}", self.authority)
    }

    /// GET requests received so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Request paths in arrival order.
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }

    /// Value of header `name` on each request, in arrival order.
    pub fn header_values(&self, name: &str) -> Vec<Option<String>> {
        self.headers
            .lock()
            .unwrap()
            .iter()
            .map(|request| {
                request
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v.clone())
            })
            .collect()
    }
}

/// Serve `body` after answering the first `fail_first` GETs with 503.
pub fn start(body: Vec<u8>, fail_first: usize) -> FlakyServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let server = FlakyServer {
        authority: format!("127.0.0.1:{}", port),
        hits: Arc::new(AtomicUsize::new(0)),
        paths: Arc::new(Mutex::new(Vec::new())),
        headers: Arc::new(Mutex::new(Vec::new())),
    };
    let body = Arc::new(body);
    let shared = server.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let shared = shared.clone();
            thread::spawn(move || handle(stream, &body, fail_first, &shared));
        }
    });
    server
}

/// Server that never succeeds.
pub fn start_failing() -> FlakyServer {
    start(Vec::new(), usize::MAX)
}

fn handle(mut stream: std::net::TcpStream, body: &[u8], fail_first: usize, server: &FlakyServer) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut lines = request.lines();
    let mut parts = lines.next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("/").to_string();
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }

    let headers = lines
        .take_while(|l| !l.is_empty())
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    server.headers.lock().unwrap().push(headers);
    server.paths.lock().unwrap().push(path);
    let seen = server.hits.fetch_add(1, Ordering::SeqCst);
    if seen < fail_first {
        let _ = stream.write_all(
            b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }
    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nContent-Type: application/javascript\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(body);
}
