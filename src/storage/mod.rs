pub mod base;
pub mod disk;

pub use base::{PersistSummary, SnapshotStore, StorageError, StorageResult};
pub use disk::DiskSnapshotStore;
