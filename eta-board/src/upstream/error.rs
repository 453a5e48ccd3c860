//! Upstream adapter error types.

/// Coarse failure classes used by cards to choose a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Request rejected or non-success status.
    NetworkFailure,
    /// Expected field absent or malformed.
    ShapeFailure,
    /// Valid response with an empty schedule.
    NoData,
}

/// Errors from the upstream HTTP adapters.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// HTTP request failed for a reason other than connecting or timing out
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Could not connect, or the request timed out
    #[error("network error: {0}")]
    Network(String),

    /// API returned an error status code
    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("unexpected response shape: {message}")]
    Shape {
        message: String,
        body: Option<String>,
    },

    /// Valid response, but no schedule to show
    #[error("no schedule data")]
    NoData,

    /// Upstream reports the service as suspended
    #[error("service suspended: {0}")]
    Suspended(String),

    /// The operator offers no data for this view
    #[error("not supported: {0}")]
    Unsupported(&'static str),
}

impl UpstreamError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            UpstreamError::Http(_) | UpstreamError::Network(_) | UpstreamError::Status { .. } => {
                ErrorKind::NetworkFailure
            }
            UpstreamError::Shape { .. } => ErrorKind::ShapeFailure,
            UpstreamError::NoData | UpstreamError::Suspended(_) | UpstreamError::Unsupported(_) => {
                ErrorKind::NoData
            }
        }
    }

    /// Build a shape error, keeping a prefix of the offending body.
    pub(crate) fn shape(message: impl Into<String>, body: &str) -> Self {
        UpstreamError::Shape {
            message: message.into(),
            body: Some(body.chars().take(500).collect()),
        }
    }
}
