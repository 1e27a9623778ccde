use reqwest::header;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: Url },

    #[error("HTTP client error: {0}")]
    HttpError(reqwest::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] header::InvalidHeaderValue),

    #[error("Failed to decode response body: {0}")]
    DecodingError(String),

    #[error("Request pool is closed")]
    PoolClosed,
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout(error.to_string())
        } else if error.is_connect() {
            FetchError::Connection(error.to_string())
        } else if error.is_decode() {
            FetchError::DecodingError(error.to_string())
        } else {
            FetchError::HttpError(error)
        }
    }
}

impl FetchError {
    /// Failures worth another try later: deadlines, dropped connections, throttling, 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout(_) | FetchError::Connection(_) => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Client errors other than throttling; retrying cannot change the answer.
    pub fn is_permanent(&self) -> bool {
        matches!(self, FetchError::Status { status, .. } if (400..500).contains(status) && *status != 429)
    }

    /// Whether this failure says something about the remote side rather than one artist's page.
    /// 403 and 429 are the usual anti-bot answers; 401/404 only concern the requested target.
    pub fn trips_breaker(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => {
                *status == 403 || *status == 429 || *status >= 500
            }
            FetchError::PoolClosed | FetchError::InvalidHeaderValue(_) => false,
            _ => true,
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
