pub mod collector;
pub mod config;
pub mod core;
pub mod http;
pub mod parser;
pub mod platforms;
pub mod scrapers;
pub mod stats;
pub mod storage;

pub use collector::{ArtistMetricsCollector, ArtistRecord, ArtistSpec, MonthlyListeners, RunRecord};
pub use config::{CollectorConfig, Credentials, Settings};
pub use self::core::{CircuitBreaker, CollectorError, CollectorResult};
pub use http::{FingerprintGenerator, PageRequest, PageResponse};
pub use parser::{ExtractionOutcome, MetricExtractor};
pub use scrapers::Scraper;
pub use stats::CollectionStats;
pub use storage::{DiskSnapshotStore, SnapshotStore};
