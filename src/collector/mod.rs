mod collector;
mod models;


pub use collector::ArtistMetricsCollector;
pub use models::{ArtistRecord, ArtistSpec, MonthlyListeners, RunRecord, SpotifyStats};
