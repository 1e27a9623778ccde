use crate::platforms::PlatformError;
use crate::scrapers::FetchError;
use crate::storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Fetch error: {0}")]
    FetchError(#[from] FetchError),

    #[error("Platform error: {0}")]
    PlatformError(#[from] PlatformError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Collection cancelled")]
    Cancelled,
}

pub type CollectorResult<T> = Result<T, CollectorError>;
