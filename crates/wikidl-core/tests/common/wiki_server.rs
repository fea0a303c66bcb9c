//! Minimal HTTP/1.1 server that imitates the two Wikipedia endpoints for integration tests.
//!
//! `GET /wiki/Special:Random` answers `302 Found` with a `Location` pointing at
//! `/wiki/<title>`; `GET /w/index.php?title=<title>&printable=yes` answers
//! `200 OK` with [`article_body`] for that title. Every connection is closed
//! after one response.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct WikiServerOptions {
    /// If false, the random endpoint answers 200 without a `Location` header.
    pub send_location: bool,
    /// If set, every random redirect points at this title; otherwise `Article_<n>`.
    pub fixed_title: Option<&'static str>,
    /// If set, the redirect path is written as these raw bytes (overrides `fixed_title`).
    pub raw_title: Option<&'static [u8]>,
    /// If true, article requests are dropped without any response.
    pub drop_article_requests: bool,
    /// Delay before answering an article request.
    pub article_delay: Duration,
}

impl Default for WikiServerOptions {
    fn default() -> Self {
        Self {
            send_location: true,
            fixed_title: None,
            raw_title: None,
            drop_article_requests: false,
            article_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Default)]
pub struct ServerStats {
    /// Request targets in arrival order (e.g. `/w/index.php?title=Cat&printable=yes`).
    pub requests: Mutex<Vec<String>>,
    next_title: AtomicUsize,
    in_flight: AtomicUsize,
    /// Highest number of article requests being answered at the same moment.
    pub peak_in_flight: AtomicUsize,
}

impl ServerStats {
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

pub struct WikiServer {
    /// e.g. "http://127.0.0.1:12345"
    pub origin: String,
    pub stats: Arc<ServerStats>,
}

/// Printable page served for `title`; contains multi-byte UTF-8 on purpose.
pub fn article_body(title: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>{t} - Wikipedia</title></head>\
         <body><h1>{t}</h1><p>Zürich – 東京 – ✓</p></body></html>",
        t = title
    )
}

pub fn start() -> WikiServer {
    start_with_options(WikiServerOptions::default())
}

/// Starts a server in a background thread. The server runs until the process exits.
pub fn start_with_options(opts: WikiServerOptions) -> WikiServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let origin = format!("http://127.0.0.1:{}", port);
    let stats = Arc::new(ServerStats::default());

    let server_origin = origin.clone();
    let server_stats = Arc::clone(&stats);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let origin = server_origin.clone();
            let stats = Arc::clone(&server_stats);
            thread::spawn(move || handle(stream, &origin, &stats, opts));
        }
    });

    WikiServer { origin, stats }
}

fn handle(mut stream: TcpStream, origin: &str, stats: &ServerStats, opts: WikiServerOptions) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
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
    let Some(target) = request_target(request) else {
        return;
    };
    stats.requests.lock().unwrap().push(target.to_string());

    if target.starts_with("/wiki/Special:Random") {
        if let (true, Some(raw)) = (opts.send_location, opts.raw_title) {
            let mut response = format!("HTTP/1.1 302 Found\r\nLocation: {}/wiki/", origin).into_bytes();
            response.extend_from_slice(raw);
            response.extend_from_slice(b"\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
            let _ = stream.write_all(&response);
            return;
        }
        let response = if opts.send_location {
            let title = match opts.fixed_title {
                Some(t) => t.to_string(),
                None => format!(
                    "Article_{}",
                    stats.next_title.fetch_add(1, Ordering::SeqCst)
                ),
            };
            format!(
                "HTTP/1.1 302 Found\r\nLocation: {}/wiki/{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                origin, title
            )
        } else {
            "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nno".to_string()
        };
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    if let Some(query) = target.strip_prefix("/w/index.php?") {
        if opts.drop_article_requests {
            return;
        }
        let title = query_param(query, "title").unwrap_or("");
        let now = stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        stats.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        thread::sleep(opts.article_delay);
        let body = article_body(title);
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=UTF-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(body.as_bytes());
        stats.in_flight.fetch_sub(1, Ordering::SeqCst);
        return;
    }

    let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
}

/// Target of the request line (`GET <target> HTTP/1.1`).
fn request_target(request: &str) -> Option<&str> {
    let line = request.lines().next()?;
    let mut parts = line.split_whitespace();
    let _method = parts.next()?;
    parts.next()
}

/// Raw (not percent-decoded) value of `name` in a query string.
fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == name).then_some(v)
    })
}
