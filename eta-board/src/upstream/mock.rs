//! Mock transport for testing without network access.
//!
//! Serves canned bodies keyed by full URL and records how often, and how
//! concurrently, each URL was requested.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::error::UpstreamError;
use super::fetch::HttpFetch;

#[derive(Debug, Clone)]
enum MockResponse {
    Body(String),
    Status(u16),
    Network,
}

/// Canned-response transport.
#[derive(Debug, Default)]
pub struct MockFetch {
    responses: Mutex<HashMap<String, MockResponse>>,
    hits: Mutex<HashMap<String, usize>>,
    delay: Mutex<Option<Duration>>,
    /// Per URL: (currently outstanding, highest outstanding seen).
    in_flight: Mutex<HashMap<String, (usize, usize)>>,
}

impl MockFetch {
    /// Create an empty mock; unknown URLs answer 404.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub fn with_body(self, url: &str, body: impl Into<String>) -> Self {
        self.set_body(url, body);
        self
    }

    /// Answer `url` with a transport failure.
    pub fn with_network_error(self, url: &str) -> Self {
        self.set(url, MockResponse::Network);
        self
    }

    /// Answer `url` with an HTTP error status.
    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.set(url, MockResponse::Status(status));
        self
    }

    /// Delay every response (uses tokio time, so paused tests stay fast).
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    /// Replace the body served for `url`.
    pub fn set_body(&self, url: &str, body: impl Into<String>) {
        self.set(url, MockResponse::Body(body.into()));
    }

    /// Make `url` fail at the transport level from now on.
    pub fn set_network_error(&self, url: &str) {
        self.set(url, MockResponse::Network);
    }

    fn set(&self, url: &str, response: MockResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    /// Number of requests made for `url`.
    pub fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    /// Number of requests made for any URL.
    pub fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().values().sum()
    }

    /// Highest number of simultaneously outstanding requests seen for `url`.
    pub fn max_in_flight(&self, url: &str) -> usize {
        self.in_flight
            .lock()
            .unwrap()
            .get(url)
            .map(|&(_, max)| max)
            .unwrap_or(0)
    }
}

impl HttpFetch for MockFetch {
    async fn get_text(&self, url: &str) -> Result<String, UpstreamError> {
        *self.hits.lock().unwrap().entry(url.to_string()).or_default() += 1;
        let response = self.responses.lock().unwrap().get(url).cloned();
        let delay = *self.delay.lock().unwrap();

        {
            let mut in_flight = self.in_flight.lock().unwrap();
            let entry = in_flight.entry(url.to_string()).or_default();
            entry.0 += 1;
            entry.1 = entry.1.max(entry.0);
        }
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(entry) = self.in_flight.lock().unwrap().get_mut(url) {
            entry.0 -= 1;
        }

        match response {
            Some(MockResponse::Body(body)) => Ok(body),
            Some(MockResponse::Status(status)) => Err(UpstreamError::Status {
                status,
                message: String::new(),
            }),
            Some(MockResponse::Network) => Err(UpstreamError::Network(format!(
                "connection refused: {url}"
            ))),
            None => Err(UpstreamError::Status {
                status: 404,
                message: format!("no mock response for {url}"),
            }),
        }
    }
}
