use log::{debug, error, info, trace, warn};
use reqwest::header::{HeaderValue, ORIGIN, REFERER};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use super::models::{ArtistRecord, ArtistSpec, MonthlyListeners, RunRecord, SpotifyStats};
use crate::config::CollectorConfig;
use crate::core::{CircuitBreaker, CircuitState, CollectorError, CollectorResult};
use crate::http::{FingerprintGenerator, PageRequest};
use crate::parser::{ExtractionOutcome, MetricExtractor};
use crate::platforms::{PlatformError, SpotifyApi, TokenProvider, YoutubeApi, YoutubeChannelStats};
use crate::scrapers::{FetchError, Scraper};
use crate::stats::CollectionStats;

/// Page fetches per artist: the first try plus one retry with new headers.
const SCRAPE_ATTEMPTS: u32 = 2;

struct SpotifyClients {
    api: Box<dyn SpotifyApi>,
    tokens: Box<dyn TokenProvider>,
}

/// Why a scrape attempt produced no count.
enum AttemptFailure {
    Miss,
    Fetch(FetchError),
}

/// Walks the roster one artist at a time, merging API metrics with the
/// scraped listener count into a [`RunRecord`].
pub struct ArtistMetricsCollector {
    scraper: Box<dyn Scraper>,
    config: CollectorConfig,
    fingerprint: FingerprintGenerator,
    breaker: CircuitBreaker,
    extractor: MetricExtractor,
    spotify: Option<SpotifyClients>,
    youtube: Option<Box<dyn YoutubeApi>>,
    stats: CollectionStats,
    cancel: CancellationToken,
}

impl ArtistMetricsCollector {
    pub fn new(scraper: Box<dyn Scraper>, config: CollectorConfig) -> Self {
        Self {
            breaker: CircuitBreaker::new(config.breaker_config()),
            scraper,
            config,
            fingerprint: FingerprintGenerator::new(),
            extractor: MetricExtractor::new(),
            spotify: None,
            youtube: None,
            stats: CollectionStats::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_spotify(mut self, api: Box<dyn SpotifyApi>, tokens: Box<dyn TokenProvider>) -> Self {
        self.spotify = Some(SpotifyClients { api, tokens });
        self
    }

    pub fn with_youtube(mut self, api: Box<dyn YoutubeApi>) -> Self {
        self.youtube = Some(api);
        self
    }

    pub fn with_extractor(mut self, extractor: MetricExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: FingerprintGenerator) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn stats(&self) -> &CollectionStats {
        &self.stats
    }

    /// Collects every artist into `record`.
    ///
    /// Per-artist failures degrade to defaults and never end the run. Only
    /// cancellation returns early, leaving the artists collected so far in
    /// `record`.
    pub async fn run(&self, artists: &[ArtistSpec], record: &mut RunRecord) -> CollectorResult<()> {
        info!("Collecting {} artists for {}", artists.len(), record.date);
        let spotify_enabled = self.open_spotify_session().await?;

        for (index, artist) in artists.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(CollectorError::Cancelled);
            }

            let artist_record = self.collect_artist(artist, spotify_enabled).await?;
            record.artists.push(artist_record);
            info!(
                "Progress: {}/{} artists processed",
                record.artists.len(),
                artists.len()
            );

            if index + 1 < artists.len() {
                self.pause(self.config.artist_pacing).await?;
            }
        }

        self.stats.finish();
        self.stats.log_summary();
        Ok(())
    }

    /// A token failure here disables the Spotify API for the whole run.
    async fn open_spotify_session(&self) -> CollectorResult<bool> {
        let Some(spotify) = &self.spotify else {
            warn!("Spotify credentials not configured, API metrics disabled for this run");
            return Ok(false);
        };

        match self.guarded(spotify.tokens.access_token()).await? {
            Ok(_) => Ok(true),
            Err(e) => {
                error!("Failed to get Spotify token: {}", e);
                Ok(false)
            }
        }
    }

    async fn collect_artist(
        &self,
        artist: &ArtistSpec,
        spotify_enabled: bool,
    ) -> CollectorResult<ArtistRecord> {
        info!("Collecting data for {}...", artist.name);
        self.stats.record_artist();

        let mut spotify = self.spotify_stats(artist, spotify_enabled).await?;

        if let Some(page_id) = artist.scrape_target() {
            spotify.monthly_listeners = self.scrape_listeners(&artist.name, page_id).await?;
            self.pause(self.fingerprint.generate_delay(self.config.scrape_delay))
                .await?;
        }
        if spotify.monthly_listeners.is_available() {
            self.stats.record_listeners_found();
        }

        let youtube = self.youtube_stats(artist).await?;

        Ok(ArtistRecord {
            name: artist.name.clone(),
            spotify,
            youtube,
        })
    }

    async fn spotify_stats(
        &self,
        artist: &ArtistSpec,
        spotify_enabled: bool,
    ) -> CollectorResult<SpotifyStats> {
        let Some(artist_id) = artist.spotify_id.as_deref() else {
            info!("{} has no Spotify ID, skipping Spotify data collection", artist.name);
            return Ok(SpotifyStats::default());
        };
        let Some(spotify) = self.spotify.as_ref().filter(|_| spotify_enabled) else {
            return Ok(SpotifyStats::default());
        };

        let token = match self.guarded(spotify.tokens.access_token()).await? {
            Ok(token) => token,
            Err(e) => {
                error!("Spotify token unavailable for {}: {}", artist.name, e);
                return Ok(SpotifyStats::default());
            }
        };

        match self.guarded(spotify.api.artist_metrics(artist_id, &token)).await? {
            Ok(metrics) => {
                if metrics.popularity > 0 {
                    self.stats.record_spotify_success();
                }
                Ok(SpotifyStats::from(metrics))
            }
            Err(PlatformError::Unauthorized { .. }) => {
                error!("Spotify API authentication failed for {}", artist_id);
                Ok(SpotifyStats::default())
            }
            Err(e) => {
                error!("Error getting Spotify data for {}: {}", artist_id, e);
                Ok(SpotifyStats::default())
            }
        }
    }

    async fn youtube_stats(&self, artist: &ArtistSpec) -> CollectorResult<YoutubeChannelStats> {
        let (Some(channel_id), Some(youtube)) = (artist.youtube_id.as_deref(), &self.youtube)
        else {
            return Ok(YoutubeChannelStats::default());
        };

        match self.guarded(youtube.channel_stats(channel_id)).await? {
            Ok(stats) => {
                if stats.subscribers > 0 {
                    self.stats.record_youtube_success();
                }
                Ok(stats)
            }
            Err(PlatformError::QuotaExceeded { .. }) => {
                error!(
                    "YouTube API quota exceeded or API key invalid for channel {}",
                    channel_id
                );
                Ok(YoutubeChannelStats::default())
            }
            Err(e) => {
                error!("Error getting YouTube data for {}: {}", channel_id, e);
                Ok(YoutubeChannelStats::default())
            }
        }
    }

    /// Fetches the public page and extracts the listener count, reporting the
    /// final outcome to the circuit breaker.
    async fn scrape_listeners(
        &self,
        artist_name: &str,
        page_id: &str,
    ) -> CollectorResult<MonthlyListeners> {
        if !self.breaker.can_proceed() {
            warn!("Circuit breaker is open, skipping page for {}", artist_name);
            self.stats.record_breaker_skip();
            return Ok(MonthlyListeners::Unavailable);
        }

        let url = match self.config.page_url(page_id) {
            Ok(url) => url,
            Err(e) => {
                error!("Cannot build page URL for {}: {}", artist_name, e);
                return Ok(MonthlyListeners::Unavailable);
            }
        };
        let origin = url.origin().ascii_serialization();
        let referer = HeaderValue::from_str(&format!("{}/", origin)).map_err(FetchError::from)?;
        let origin = HeaderValue::from_str(&origin).map_err(FetchError::from)?;

        let mut last_failure = AttemptFailure::Miss;
        for attempt in 1..=SCRAPE_ATTEMPTS {
            let headers = if attempt == 1 {
                self.fingerprint.generate_headers()
            } else {
                self.fingerprint.generate_retry_headers()
            };
            let request = PageRequest::new(url.clone())
                .with_headers(headers)
                .with_header(REFERER, referer.clone())
                .with_header(ORIGIN, origin.clone())
                .with_timeout(self.config.request_timeout);

            self.stats.record_scrape_attempt();
            match self.guarded(self.scraper.fetch(request)).await? {
                Ok(response) => {
                    debug!("Fetched {} bytes for {}", response.body.len(), artist_name);
                    let extraction = self.extractor.attempt(response.body, attempt, artist_name);
                    if let ExtractionOutcome::Found { value, strategy } = extraction.outcome {
                        self.breaker.record_success();
                        info!(
                            "Found monthly listeners for {}: {} (attempt {}, {})",
                            artist_name, value, extraction.attempt, strategy
                        );
                        return Ok(MonthlyListeners::Count(value));
                    }
                    trace!(
                        "Page snippet for {}: {}",
                        artist_name,
                        extraction.document.chars().take(500).collect::<String>()
                    );
                    last_failure = AttemptFailure::Miss;
                }
                Err(error) if error.is_transient() => {
                    warn!(
                        "Attempt {} for {} failed: {}",
                        attempt, artist_name, error
                    );
                    last_failure = AttemptFailure::Fetch(error);
                }
                Err(error) => {
                    error!("Permanent failure fetching page for {}: {}", artist_name, error);
                    if error.trips_breaker() {
                        self.breaker.record_failure();
                    } else if self.breaker.state() == CircuitState::HalfOpen {
                        // the trial reached the target; the block has lifted
                        self.breaker.record_success();
                    }
                    return Ok(MonthlyListeners::Unavailable);
                }
            }

            if attempt < SCRAPE_ATTEMPTS {
                self.pause(self.fingerprint.generate_delay(self.config.retry_delay))
                    .await?;
            }
        }

        match last_failure {
            AttemptFailure::Miss => {
                warn!("Could not find monthly listeners for {}", artist_name)
            }
            AttemptFailure::Fetch(error) => {
                error!("Giving up on page for {}: {}", artist_name, error)
            }
        }
        self.breaker.record_failure();
        Ok(MonthlyListeners::Unavailable)
    }

    /// Runs `future` unless the run is cancelled first.
    async fn guarded<F: Future>(&self, future: F) -> CollectorResult<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(CollectorError::Cancelled),
            output = future => Ok(output),
        }
    }

    async fn pause(&self, delay: Duration) -> CollectorResult<()> {
        if delay.is_zero() {
            return Ok(());
        }
        self.guarded(sleep(delay)).await
    }
}
