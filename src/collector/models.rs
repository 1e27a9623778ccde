use chrono::NaiveDate;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::platforms::{SpotifyArtistMetrics, TopTrack, YoutubeChannelStats};

/// One roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistSpec {
    pub name: String,
    #[serde(default)]
    pub spotify_id: Option<String>,
    #[serde(default)]
    pub page_id: Option<String>,
    #[serde(default)]
    pub youtube_id: Option<String>,
}

impl ArtistSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spotify_id: None,
            page_id: None,
            youtube_id: None,
        }
    }

    pub fn with_spotify_id(mut self, id: impl Into<String>) -> Self {
        self.spotify_id = Some(id.into());
        self
    }

    pub fn with_page_id(mut self, id: impl Into<String>) -> Self {
        self.page_id = Some(id.into());
        self
    }

    pub fn with_youtube_id(mut self, id: impl Into<String>) -> Self {
        self.youtube_id = Some(id.into());
        self
    }

    /// Identifier of the public page; both platforms share artist ids.
    pub fn scrape_target(&self) -> Option<&str> {
        self.page_id.as_deref().or(self.spotify_id.as_deref())
    }
}

/// Scraped listener count, or `"N/A"` when it could not be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonthlyListeners {
    Count(u64),
    #[default]
    Unavailable,
}

const UNAVAILABLE: &str = "N/A";

impl MonthlyListeners {
    pub fn count(&self) -> Option<u64> {
        match self {
            Self::Count(count) => Some(*count),
            Self::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Count(_))
    }
}

impl fmt::Display for MonthlyListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(count) => write!(f, "{}", count),
            Self::Unavailable => f.write_str(UNAVAILABLE),
        }
    }
}

impl Serialize for MonthlyListeners {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Count(count) => serializer.serialize_u64(*count),
            Self::Unavailable => serializer.serialize_str(UNAVAILABLE),
        }
    }
}

struct MonthlyListenersVisitor;

impl Visitor<'_> for MonthlyListenersVisitor {
    type Value = MonthlyListeners;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer or \"N/A\"")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(MonthlyListeners::Count(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        u64::try_from(value)
            .map(MonthlyListeners::Count)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        if value == UNAVAILABLE {
            return Ok(MonthlyListeners::Unavailable);
        }
        value
            .parse()
            .map(MonthlyListeners::Count)
            .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
    }
}

impl<'de> Deserialize<'de> for MonthlyListeners {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MonthlyListenersVisitor)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpotifyStats {
    pub popularity_score: u32,
    pub followers: u64,
    pub monthly_listeners: MonthlyListeners,
    pub genres: Vec<String>,
    pub top_tracks: Vec<TopTrack>,
}

impl From<SpotifyArtistMetrics> for SpotifyStats {
    fn from(metrics: SpotifyArtistMetrics) -> Self {
        Self {
            popularity_score: metrics.popularity,
            followers: metrics.followers,
            monthly_listeners: MonthlyListeners::Unavailable,
            genres: metrics.genres,
            top_tracks: metrics.top_tracks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRecord {
    pub name: String,
    pub spotify: SpotifyStats,
    pub youtube: YoutubeChannelStats,
}

/// Everything collected in one run, keyed by the run date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub date: NaiveDate,
    pub artists: Vec<ArtistRecord>,
}

impl RunRecord {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            artists: Vec::new(),
        }
    }

    pub fn missing_listeners(&self) -> Vec<&str> {
        self.artists
            .iter()
            .filter(|artist| !artist.spotify.monthly_listeners.is_available())
            .map(|artist| artist.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scrape_target_falls_back_to_api_id() {
        let artist = ArtistSpec::new("A").with_spotify_id("sp");
        assert_eq!(artist.scrape_target(), Some("sp"));

        let artist = artist.with_page_id("page");
        assert_eq!(artist.scrape_target(), Some("page"));

        assert_eq!(ArtistSpec::new("B").scrape_target(), None);
    }

    #[test]
    fn test_monthly_listeners_serialization() {
        assert_eq!(
            serde_json::to_value(MonthlyListeners::Count(1_200)).unwrap(),
            json!(1200)
        );
        assert_eq!(
            serde_json::to_value(MonthlyListeners::Unavailable).unwrap(),
            json!("N/A")
        );
        assert_eq!(
            serde_json::from_value::<MonthlyListeners>(json!("N/A")).unwrap(),
            MonthlyListeners::Unavailable
        );
        assert_eq!(
            serde_json::from_value::<MonthlyListeners>(json!(42)).unwrap(),
            MonthlyListeners::Count(42)
        );
        assert!(serde_json::from_value::<MonthlyListeners>(json!(-1)).is_err());
    }

    #[test]
    fn test_run_record_shape() {
        let mut record = RunRecord::new(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        record.artists.push(ArtistRecord {
            name: "A".to_string(),
            spotify: SpotifyStats::default(),
            youtube: YoutubeChannelStats::default(),
        });

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["date"], "2024-03-09");
        assert_eq!(value["artists"][0]["spotify"]["monthly_listeners"], "N/A");
        assert_eq!(value["artists"][0]["youtube"]["top_videos"], json!([]));
        assert_eq!(record.missing_listeners(), vec!["A"]);
    }
}
