use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::collector::ArtistSpec;
use crate::core::retry::{BackoffPolicy, RetryPolicy};
use crate::core::{CircuitBreakerConfig, CollectorError, CollectorResult};

pub const DEFAULT_PAGE_BASE_URL: &str = "https://open.spotify.com/artist/";
pub const DEFAULT_OUTPUT_DIR: &str = "data";
/// Upper bound on scraper retries accepted from a settings file.
pub const MAX_RETRIES_LIMIT: usize = 10;

/// Platform identifiers must stay a single path segment of the configured host.
pub fn is_valid_platform_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Durations are written as (fractional) seconds in settings files.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let seconds = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(seconds).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
    /// Base of the jittered pause after each page scrape.
    #[serde(with = "duration_secs")]
    pub scrape_delay: Duration,
    /// Base of the jittered pause before the second scrape attempt.
    #[serde(with = "duration_secs")]
    pub retry_delay: Duration,
    #[serde(with = "duration_secs")]
    pub artist_pacing: Duration,
    pub page_base_url: Url,
    pub breaker_threshold: u32,
    #[serde(with = "duration_secs")]
    pub breaker_recovery: Duration,
    pub max_retries: usize,
    #[serde(with = "duration_secs")]
    pub retry_initial_delay: Duration,
    #[serde(with = "duration_secs")]
    pub retry_max_delay: Duration,
    pub max_in_flight: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(15),
            scrape_delay: Duration::from_secs(2),
            retry_delay: Duration::from_millis(1500),
            artist_pacing: Duration::from_secs(1),
            page_base_url: Url::parse(DEFAULT_PAGE_BASE_URL).expect("valid default page URL"),
            breaker_threshold: 3,
            breaker_recovery: Duration::from_secs(300),
            max_retries: 3,
            retry_initial_delay: Duration::from_secs(1),
            retry_max_delay: Duration::from_secs(30),
            max_in_flight: 10,
        }
    }
}

impl CollectorConfig {
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_scrape_delay(mut self, delay: Duration) -> Self {
        self.scrape_delay = delay;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_artist_pacing(mut self, pacing: Duration) -> Self {
        self.artist_pacing = pacing;
        self
    }

    pub fn with_page_base_url(mut self, url: Url) -> Self {
        self.page_base_url = url;
        self
    }

    pub fn with_breaker(mut self, threshold: u32, recovery: Duration) -> Self {
        self.breaker_threshold = threshold;
        self.breaker_recovery = recovery;
        self
    }

    pub fn with_retries(mut self, max_retries: usize, initial_delay: Duration, max_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_initial_delay = initial_delay;
        self.retry_max_delay = max_delay;
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_retries(self.max_retries)
            .with_initial_delay(self.retry_initial_delay)
            .with_max_delay(self.retry_max_delay)
            .with_backoff(BackoffPolicy::Exponential { factor: 2.0 })
    }

    pub fn breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.breaker_threshold,
            recovery_timeout: self.breaker_recovery,
        }
    }

    /// Public page for an artist identifier.
    pub fn page_url(&self, page_id: &str) -> CollectorResult<Url> {
        if !is_valid_platform_id(page_id) {
            return Err(CollectorError::ConfigError(format!(
                "invalid page identifier: {:?}",
                page_id
            )));
        }
        let mut base = self.page_base_url.clone();
        if !base.path().ends_with('/') {
            let directory = format!("{}/", base.path());
            base.set_path(&directory);
        }
        Ok(base.join(page_id)?)
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

/// Roster and run options, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub artists: Vec<ArtistSpec>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub collector: CollectorConfig,
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> CollectorResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CollectorError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> CollectorResult<Self> {
        let settings: Settings = serde_json::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> CollectorResult<()> {
        if self.artists.is_empty() {
            return Err(CollectorError::ConfigError(
                "artist roster is empty".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for artist in &self.artists {
            if artist.name.trim().is_empty() {
                return Err(CollectorError::ConfigError(
                    "artist with an empty name".to_string(),
                ));
            }
            if !names.insert(artist.name.as_str()) {
                return Err(CollectorError::ConfigError(format!(
                    "duplicate artist name: {}",
                    artist.name
                )));
            }
            let ids = [&artist.spotify_id, &artist.page_id, &artist.youtube_id];
            if let Some(id) = ids
                .into_iter()
                .flatten()
                .find(|id| !is_valid_platform_id(id))
            {
                return Err(CollectorError::ConfigError(format!(
                    "invalid identifier {:?} for artist {}",
                    id, artist.name
                )));
            }
        }

        if self.collector.max_retries > MAX_RETRIES_LIMIT {
            return Err(CollectorError::ConfigError(format!(
                "max_retries must be at most {}",
                MAX_RETRIES_LIMIT
            )));
        }

        if self.collector.max_in_flight == 0 {
            return Err(CollectorError::ConfigError(
                "max_in_flight must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Platform secrets, read from the environment only.
#[derive(Clone, Default)]
pub struct Credentials {
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub youtube_api_key: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            spotify_client_id: read("SPOTIFY_CLIENT_ID"),
            spotify_client_secret: read("SPOTIFY_CLIENT_SECRET"),
            youtube_api_key: read("YOUTUBE_API_KEY"),
        }
    }

    pub fn spotify(&self) -> Option<(&str, &str)> {
        Some((
            self.spotify_client_id.as_deref()?,
            self.spotify_client_secret.as_deref()?,
        ))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("spotify_client_id", &redact(&self.spotify_client_id))
            .field("spotify_client_secret", &redact(&self.spotify_client_secret))
            .field("youtube_api_key", &redact(&self.youtube_api_key))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_minimal_settings() {
        let settings = Settings::from_json(
            r#"{"artists": [{"name": "Solo", "spotify_id": "abc"}]}"#,
        )
        .unwrap();

        assert_eq!(settings.output_dir, PathBuf::from("data"));
        assert_eq!(settings.collector.request_timeout, Duration::from_secs(15));
        assert_eq!(settings.artists[0].scrape_target(), Some("abc"));
    }

    #[test]
    fn test_collector_section_in_seconds() {
        let settings = Settings::from_json(
            r#"{
                "artists": [{"name": "A"}],
                "output_dir": "/tmp/out",
                "collector": {"scrape_delay": 0.5, "breaker_threshold": 5, "page_base_url": "http://localhost:9000/artist"}
            }"#,
        )
        .unwrap();

        let collector = &settings.collector;
        assert_eq!(collector.scrape_delay, Duration::from_millis(500));
        assert_eq!(collector.breaker_threshold, 5);
        assert_eq!(collector.artist_pacing, Duration::from_secs(1));
        assert_eq!(
            collector.page_url("xyz").unwrap().as_str(),
            "http://localhost:9000/artist/xyz"
        );
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let error = Settings::from_json(r#"{"artists": [{"name": "A"}, {"name": "A"}]}"#)
            .unwrap_err();
        assert!(matches!(error, CollectorError::ConfigError(message) if message.contains("duplicate")));
    }

    #[test]
    fn test_identifier_outside_base_url_rejected() {
        for id in ["https://other.host/x", "//[::1", "../admin", "a b", ""] {
            let json = serde_json::json!({"artists": [{"name": "A", "page_id": id}]});
            let error = Settings::from_json(&json.to_string()).unwrap_err();
            assert!(
                matches!(&error, CollectorError::ConfigError(message) if message.contains("invalid identifier")),
                "{id}: {error}"
            );
        }
        assert!(CollectorConfig::default().page_url("https://other.host/x").is_err());
        assert_eq!(
            CollectorConfig::default().page_url("0TnOYISbd1XYRBk9myaseg").unwrap().host_str(),
            Some("open.spotify.com")
        );
    }

    #[test]
    fn test_excessive_retries_rejected() {
        let result = Settings::from_json(
            r#"{"artists": [{"name": "A"}], "collector": {"max_retries": 1000}}"#,
        );
        assert!(matches!(result, Err(CollectorError::ConfigError(message)) if message.contains("max_retries")));
    }

    #[test]
    fn test_empty_roster_rejected() {
        assert!(Settings::from_json(r#"{"artists": []}"#).is_err());
    }

    #[test]
    fn test_negative_duration_rejected() {
        let result = Settings::from_json(
            r#"{"artists": [{"name": "A"}], "collector": {"retry_delay": -1}}"#,
        );
        assert!(matches!(result, Err(CollectorError::JsonError(_))));
    }

    #[test]
    fn test_credentials_lookup() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SPOTIFY_CLIENT_ID", "id"),
            ("SPOTIFY_CLIENT_SECRET", "hunter2"),
            ("YOUTUBE_API_KEY", " "),
        ]);
        let credentials = Credentials::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(credentials.spotify(), Some(("id", "hunter2")));
        assert_eq!(credentials.youtube_api_key, None);
        assert!(!format!("{:?}", credentials).contains("hunter2"));
    }

    #[test]
    fn test_retry_policy_from_config() {
        let config = CollectorConfig::default().with_retries(
            1,
            Duration::from_millis(10),
            Duration::from_millis(20),
        );
        let policy = config.retry_policy();
        assert_eq!(policy.max_retries, 1);
        assert_eq!(policy.calculate_delay(3), Duration::from_millis(20));
    }
}
