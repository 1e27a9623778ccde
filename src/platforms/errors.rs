use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("{platform} rejected the credentials")]
    Unauthorized { platform: &'static str },

    #[error("{platform} quota exceeded or API key invalid")]
    QuotaExceeded { platform: &'static str },

    #[error("{platform} responded with status {status}")]
    Http { platform: &'static str, status: u16 },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("{platform} returned an unexpected payload: {message}")]
    Payload {
        platform: &'static str,
        message: String,
    },

    #[error("Missing credentials for {0}")]
    MissingCredentials(&'static str),
}

impl PlatformError {
    pub(crate) fn from_status(platform: &'static str, status: u16) -> Self {
        match status {
            401 => Self::Unauthorized { platform },
            403 if platform == super::youtube::PLATFORM => Self::QuotaExceeded { platform },
            _ => Self::Http { platform, status },
        }
    }
}

pub type PlatformResult<T> = Result<T, PlatformError>;
