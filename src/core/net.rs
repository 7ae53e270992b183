// src/core/net.rs
// Blocking HTTPS GET over one shared agent (connection reuse across workers).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::config::consts::{BACKOFF_MS, HTTP_TIMEOUT_SECS, RETRIES};
use crate::error::FetchError;

/// Rotated per request.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0 Safari/537.36",
];

pub struct HttpClient {
    agent: ureq::Agent,
    next_ua: AtomicUsize,
    retries: u32,
    backoff: Duration,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    pub fn new() -> Self {
        let timeout = Duration::from_secs(HTTP_TIMEOUT_SECS);
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .build();
        Self {
            agent,
            next_ua: AtomicUsize::new(0),
            retries: RETRIES,
            backoff: Duration::from_millis(BACKOFF_MS),
        }
    }

    fn user_agent(&self) -> &'static str {
        let i = self.next_ua.fetch_add(1, Ordering::Relaxed);
        USER_AGENTS[i % USER_AGENTS.len()]
    }

    /// GET `url` and return the body.
    ///
    /// Connection-level failures are retried with doubling backoff; an HTTP
    /// error status is returned as-is.
    pub fn get(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0u32;
        loop {
            let resp = self
                .agent
                .get(url)
                .set("User-Agent", self.user_agent())
                .set("Accept", "*/*")
                .call();

            match resp {
                Ok(resp) => {
                    return resp.into_string().map_err(|e| FetchError::Body { url: s!(url), source: e });
                }
                Err(ureq::Error::Status(code, _)) => {
                    return Err(FetchError::Status { url: s!(url), code });
                }
                Err(ureq::Error::Transport(t)) if attempt < self.retries => {
                    let pause = self.backoff * 2u32.pow(attempt);
                    attempt += 1;
                    warn!(%url, attempt, error = %t, "request failed, retrying in {:?}", pause);
                    thread::sleep(pause);
                }
                Err(ureq::Error::Transport(t)) => {
                    return Err(FetchError::Transport { url: s!(url), message: t.to_string() });
                }
            }
        }
    }
}
