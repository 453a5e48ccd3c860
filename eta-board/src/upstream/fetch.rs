//! HTTP transport used by every adapter.
//!
//! Adapters only need "GET this URL as text"; keeping that behind a trait
//! lets tests substitute canned responses for the live feeds.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;

use super::error::UpstreamError;

/// Fetches a URL and returns the response body.
pub trait HttpFetch: Send + Sync + 'static {
    /// GET `url`, failing on transport errors and non-success statuses.
    fn get_text(&self, url: &str) -> impl Future<Output = Result<String, UpstreamError>> + Send;
}

/// Live transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestFetch {
    http: reqwest::Client,
}

impl ReqwestFetch {
    /// Create a client with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

impl HttpFetch for ReqwestFetch {
    async fn get_text(&self, url: &str) -> Result<String, UpstreamError> {
        let response = self.http.get(url).send().await.map_err(transport_error)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: body,
            });
        }

        response.text().await.map_err(transport_error)
    }
}

/// Connection failures and timeouts are network errors; anything else
/// reqwest reports stays an HTTP error.
fn transport_error(e: reqwest::Error) -> UpstreamError {
    if e.is_connect() || e.is_timeout() {
        UpstreamError::Network(e.to_string())
    } else {
        UpstreamError::Http(e)
    }
}

/// GET `url` and decode the body as JSON.
pub(crate) async fn get_json<F, T>(fetch: &F, url: &str) -> Result<T, UpstreamError>
where
    F: HttpFetch,
    T: DeserializeOwned,
{
    let body = fetch.get_text(url).await?;
    serde_json::from_str(&body).map_err(|e| UpstreamError::shape(e.to_string(), &body))
}
