use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::errors::{PlatformError, PlatformResult};
use super::{check_status, endpoint};

pub const PLATFORM: &str = "spotify";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1/";
const TOP_TRACK_LIMIT: usize = 5;
const TOP_TRACK_MARKET: &str = "US";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopTrack {
    pub name: String,
    pub popularity: u32,
    pub preview_url: Option<String>,
}

/// Baseline metrics from the authenticated artist endpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpotifyArtistMetrics {
    pub name: Option<String>,
    pub popularity: u32,
    pub followers: u64,
    pub genres: Vec<String>,
    pub top_tracks: Vec<TopTrack>,
}

#[async_trait]
pub trait SpotifyApi: Send + Sync {
    async fn artist_metrics(&self, artist_id: &str, token: &str)
        -> PlatformResult<SpotifyArtistMetrics>;
}

#[derive(Deserialize)]
struct ArtistPayload {
    name: Option<String>,
    #[serde(default)]
    popularity: u32,
    #[serde(default)]
    followers: Followers,
    #[serde(default)]
    genres: Vec<String>,
}

#[derive(Deserialize, Default)]
struct Followers {
    #[serde(default)]
    total: u64,
}

#[derive(Deserialize)]
struct TopTracksPayload {
    #[serde(default)]
    tracks: Vec<TopTrack>,
}

pub struct SpotifyWebApi {
    client: Client,
    base_url: Url,
}

impl SpotifyWebApi {
    pub fn new(client: Client) -> PlatformResult<Self> {
        Ok(Self::with_base_url(client, Url::parse(DEFAULT_API_URL)?))
    }

    pub fn with_base_url(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: Url, token: &str) -> PlatformResult<T> {
        let response = self.client.get(url).bearer_auth(token).send().await?;
        let response = check_status(PLATFORM, response)?;
        response.json::<T>().await.map_err(|e| PlatformError::Payload {
            platform: PLATFORM,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl SpotifyApi for SpotifyWebApi {
    async fn artist_metrics(
        &self,
        artist_id: &str,
        token: &str,
    ) -> PlatformResult<SpotifyArtistMetrics> {
        let artist: ArtistPayload = self
            .get(endpoint(&self.base_url, &format!("artists/{artist_id}"))?, token)
            .await?;

        let mut tracks_url = endpoint(&self.base_url, &format!("artists/{artist_id}/top-tracks"))?;
        tracks_url
            .query_pairs_mut()
            .append_pair("market", TOP_TRACK_MARKET);
        let tracks: TopTracksPayload = self.get(tracks_url, token).await?;

        debug!(
            "Spotify artist {} has {} followers, {} top tracks",
            artist_id,
            artist.followers.total,
            tracks.tracks.len()
        );

        Ok(SpotifyArtistMetrics {
            name: artist.name,
            popularity: artist.popularity,
            followers: artist.followers.total,
            genres: artist.genres,
            top_tracks: tracks.tracks.into_iter().take(TOP_TRACK_LIMIT).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (SpotifyWebApi, MockServer) {
        let server = MockServer::start().await;
        let api = SpotifyWebApi::with_base_url(Client::new(), Url::parse(&server.uri()).unwrap());
        (api, server)
    }

    #[tokio::test]
    async fn test_artist_metrics() {
        let (api, server) = setup().await;

        Mock::given(method("GET"))
            .and(path("/artists/abc"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Some Artist",
                "popularity": 61,
                "followers": {"href": null, "total": 120345},
                "genres": ["latin", "reggaeton"]
            })))
            .mount(&server)
            .await;

        let tracks: Vec<_> = (0..8)
            .map(|i| json!({"name": format!("Track {i}"), "popularity": 70 - i, "preview_url": null}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/artists/abc/top-tracks"))
            .and(query_param("market", "US"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tracks": tracks })))
            .mount(&server)
            .await;

        let metrics = api.artist_metrics("abc", "tok").await.unwrap();
        assert_eq!(metrics.name.as_deref(), Some("Some Artist"));
        assert_eq!(metrics.popularity, 61);
        assert_eq!(metrics.followers, 120_345);
        assert_eq!(metrics.genres, vec!["latin", "reggaeton"]);
        assert_eq!(metrics.top_tracks.len(), 5);
        assert_eq!(metrics.top_tracks[0].name, "Track 0");
        assert_eq!(metrics.top_tracks[0].preview_url, None);
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let (api, server) = setup().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let error = api.artist_metrics("abc", "expired").await.unwrap_err();
        assert!(matches!(error, PlatformError::Unauthorized { platform: "spotify" }));
    }

    #[tokio::test]
    async fn test_not_found_is_http_error() {
        let (api, server) = setup().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let error = api.artist_metrics("nope", "tok").await.unwrap_err();
        assert!(matches!(error, PlatformError::Http { status: 404, .. }));
    }
}
