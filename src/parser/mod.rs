pub mod base;
mod extractor;
pub mod normalize;
pub(crate) mod patterns;
pub mod strategies;

pub use base::{Document, ExtractionStrategy};
pub use extractor::{ExtractionAttempt, ExtractionOutcome, MetricExtractor};
pub use normalize::normalize_count;
