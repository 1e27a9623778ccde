use chrono::{DateTime, Utc};
use log::info;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct CollectionSummary {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_artists: usize,
    pub spotify_success: usize,
    pub monthly_listeners_found: usize,
    pub youtube_success: usize,
    pub breaker_skips: usize,
    pub scrape_attempts: usize,
}

/// Per-run counters, shared by clones.
#[derive(Debug, Clone)]
pub struct CollectionStats {
    stats: Arc<RwLock<CollectionSummary>>,
}

impl CollectionStats {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(RwLock::new(CollectionSummary {
                start_time: Utc::now(),
                end_time: None,
                total_artists: 0,
                spotify_success: 0,
                monthly_listeners_found: 0,
                youtube_success: 0,
                breaker_skips: 0,
                scrape_attempts: 0,
            })),
        }
    }

    pub fn record_artist(&self) {
        self.stats.write().total_artists += 1;
    }

    pub fn record_spotify_success(&self) {
        self.stats.write().spotify_success += 1;
    }

    pub fn record_listeners_found(&self) {
        self.stats.write().monthly_listeners_found += 1;
    }

    pub fn record_youtube_success(&self) {
        self.stats.write().youtube_success += 1;
    }

    pub fn record_breaker_skip(&self) {
        self.stats.write().breaker_skips += 1;
    }

    pub fn record_scrape_attempt(&self) {
        self.stats.write().scrape_attempts += 1;
    }

    pub fn finish(&self) {
        self.stats.write().end_time = Some(Utc::now());
    }

    pub fn get_stats(&self) -> CollectionSummary {
        self.stats.read().clone()
    }

    pub fn log_summary(&self) {
        let stats = self.stats.read();
        let duration = stats
            .end_time
            .unwrap_or_else(Utc::now)
            .signed_duration_since(stats.start_time);
        let total = stats.total_artists;

        info!("{}", "=".repeat(50));
        info!("COLLECTION SUMMARY");
        info!("{}", "=".repeat(50));
        info!("Duration: {} seconds", duration.num_seconds());
        info!("Total artists: {}", total);
        info!("Spotify API success: {}/{}", stats.spotify_success, total);
        info!(
            "Monthly listeners found: {}/{}",
            stats.monthly_listeners_found, total
        );
        info!("YouTube API success: {}/{}", stats.youtube_success, total);
        info!(
            "Page fetch attempts: {} ({} skipped by circuit breaker)",
            stats.scrape_attempts, stats.breaker_skips
        );
        info!("{}", "=".repeat(50));
    }
}

impl Default for CollectionStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_counters() {
        let stats = CollectionStats::new();
        let clone = stats.clone();

        stats.record_artist();
        clone.record_artist();
        clone.record_listeners_found();
        stats.record_breaker_skip();
        stats.finish();

        let summary = stats.get_stats();
        assert_eq!(summary.total_artists, 2);
        assert_eq!(summary.monthly_listeners_found, 1);
        assert_eq!(summary.breaker_skips, 1);
        assert!(summary.end_time.is_some());
    }
}
