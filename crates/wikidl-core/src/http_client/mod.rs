//! Shared HTTP client for article requests.
//!
//! Wraps libcurl (`curl` crate) with redirect following disabled. The client
//! is `Send + Sync`: it keeps a pool of idle `Easy` handles so connections are
//! reused, and every request runs on its own checked-out handle, so concurrent
//! requests from different workers never share transfer state.

mod response;

pub use response::HttpResponse;

use std::sync::Mutex;
use std::time::Duration;

use crate::error::CleanupError;

/// Transfer settings applied to every request.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            request_timeout: Duration::from_secs(60),
            user_agent: format!("wikidl/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Default)]
struct HandlePool {
    idle: Vec<curl::easy::Easy>,
    closed: bool,
}

pub struct HttpClient {
    settings: ClientSettings,
    handles: Mutex<HandlePool>,
}

impl HttpClient {
    pub fn new(settings: ClientSettings) -> Self {
        Self {
            settings,
            handles: Mutex::new(HandlePool::default()),
        }
    }

    /// Performs a GET without following redirects and buffers the whole response.
    ///
    /// The handle goes back to the pool whether or not the transfer succeeded.
    /// Blocks the calling thread.
    pub fn get(&self, url: &str) -> Result<HttpResponse, curl::Error> {
        let mut easy = self.checkout();
        let result = perform_get(&mut easy, url, &self.settings);
        self.release(easy);
        result
    }

    /// Number of idle handles currently pooled.
    pub fn idle_handles(&self) -> usize {
        self.handles.lock().map(|p| p.idle.len()).unwrap_or(0)
    }

    /// Stops pooling and drops every idle handle, returning how many were released.
    ///
    /// Requests still in flight keep their handle until they finish; it is then
    /// dropped instead of pooled. Later requests work on throwaway handles.
    pub fn close(&self) -> Result<usize, CleanupError> {
        let mut pool = self.handles.lock().map_err(|_| CleanupError {
            reason: "handle pool lock poisoned".to_string(),
        })?;
        pool.closed = true;
        let released = pool.idle.len();
        pool.idle.clear();
        Ok(released)
    }

    fn checkout(&self) -> curl::easy::Easy {
        let pooled = match self.handles.lock() {
            Ok(mut pool) if !pool.closed => pool.idle.pop(),
            _ => None,
        };
        match pooled {
            Some(mut easy) => {
                easy.reset();
                easy
            }
            None => curl::easy::Easy::new(),
        }
    }

    fn release(&self, easy: curl::easy::Easy) {
        match self.handles.lock() {
            Ok(mut pool) => {
                if !pool.closed {
                    pool.idle.push(easy);
                }
            }
            Err(_) => tracing::warn!("HTTP handle pool lock poisoned; dropping handle"),
        }
    }
}

fn perform_get(
    easy: &mut curl::easy::Easy,
    url: &str,
    settings: &ClientSettings,
) -> Result<HttpResponse, curl::Error> {
    easy.url(url)?;
    easy.get(true)?;
    easy.follow_location(false)?;
    easy.connect_timeout(settings.connect_timeout)?;
    easy.timeout(settings.request_timeout)?;
    easy.useragent(&settings.user_agent)?;

    let mut headers: Vec<String> = Vec::new();
    let mut body: Vec<u8> = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            let line = response::decode_header_line(data);
            headers.push(line.trim_end().to_string());
            true
        })?;
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let status = easy.response_code()?;
    tracing::trace!(url, status, bytes = body.len(), "GET finished");
    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}
