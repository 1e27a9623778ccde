use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::collector::RunRecord;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage operation failed: {0}")]
    OperationError(String),

    #[error("Serialization failed: {0}")]
    SerializationError(String),
}

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        StorageError::OperationError(error.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        StorageError::SerializationError(error.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Where one persisted run ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistSummary {
    pub historical: PathBuf,
    pub latest: PathBuf,
    pub ledger: PathBuf,
    pub rows_appended: usize,
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn persist(&self, record: &RunRecord) -> StorageResult<PersistSummary>;
}
