use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use url::Url;

use super::errors::{PlatformError, PlatformResult};
use super::{check_status, endpoint};

pub const PLATFORM: &str = "youtube";
pub const DEFAULT_API_URL: &str = "https://www.googleapis.com/youtube/v3/";
const TOP_VIDEO_LIMIT: usize = 5;
const PLAYLIST_PAGE_SIZE: &str = "50";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopVideo {
    pub title: String,
    pub views: u64,
    pub video_id: String,
    pub published_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YoutubeChannelStats {
    pub subscribers: u64,
    pub total_views: u64,
    pub video_count: u64,
    pub top_videos: Vec<TopVideo>,
}

#[async_trait]
pub trait YoutubeApi: Send + Sync {
    async fn channel_stats(&self, channel_id: &str) -> PlatformResult<YoutubeChannelStats>;
}

/// Counts arrive as decimal strings; anything unparsable reads as zero.
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_u64().unwrap_or(0),
        Value::String(text) => text.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

#[derive(Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    #[serde(default, deserialize_with = "lenient_count")]
    subscriber_count: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    view_count: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    video_count: u64,
}

#[derive(Deserialize)]
struct StatisticsItem {
    statistics: ChannelStatistics,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentDetailsItem {
    content_details: ContentDetails,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Deserialize)]
struct RelatedPlaylists {
    uploads: Option<String>,
}

#[derive(Deserialize)]
struct PlaylistItem {
    snippet: PlaylistSnippet,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistSnippet {
    resource_id: ResourceId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: Option<String>,
}

#[derive(Deserialize)]
struct VideoItem {
    id: String,
    snippet: VideoSnippet,
    statistics: VideoStatistics,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    published_at: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    #[serde(default, deserialize_with = "lenient_count")]
    view_count: u64,
}

pub struct YoutubeDataApi {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl YoutubeDataApi {
    pub fn new(client: Client, api_key: String) -> PlatformResult<Self> {
        Ok(Self::with_base_url(client, Url::parse(DEFAULT_API_URL)?, api_key))
    }

    pub fn with_base_url(client: Client, base_url: Url, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, &str)],
    ) -> PlatformResult<Page<T>> {
        let mut url = endpoint(&self.base_url, resource)?;
        url.query_pairs_mut()
            .extend_pairs(params)
            .append_pair("key", &self.api_key);

        let response = check_status(PLATFORM, self.client.get(url).send().await?)?;
        response.json::<Page<T>>().await.map_err(|e| PlatformError::Payload {
            platform: PLATFORM,
            message: e.to_string(),
        })
    }

    async fn top_videos(&self, channel_id: &str) -> PlatformResult<Vec<TopVideo>> {
        let details: Page<ContentDetailsItem> = self
            .get("channels", &[("part", "contentDetails"), ("id", channel_id)])
            .await?;
        let Some(uploads) = details
            .items
            .into_iter()
            .next()
            .and_then(|item| item.content_details.related_playlists.uploads)
        else {
            return Ok(Vec::new());
        };

        let playlist: Page<PlaylistItem> = self
            .get(
                "playlistItems",
                &[
                    ("part", "snippet"),
                    ("playlistId", uploads.as_str()),
                    ("maxResults", PLAYLIST_PAGE_SIZE),
                ],
            )
            .await?;
        let video_ids: Vec<String> = playlist
            .items
            .into_iter()
            .filter_map(|item| item.snippet.resource_id.video_id)
            .collect();
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = video_ids.join(",");
        let videos: Page<VideoItem> = self
            .get("videos", &[("part", "statistics,snippet"), ("id", ids.as_str())])
            .await?;

        let mut top: Vec<TopVideo> = videos
            .items
            .into_iter()
            .map(|video| TopVideo {
                title: video.snippet.title,
                views: video.statistics.view_count,
                video_id: video.id,
                published_at: video.snippet.published_at,
            })
            .collect();
        top.sort_by(|a, b| b.views.cmp(&a.views));
        top.truncate(TOP_VIDEO_LIMIT);
        Ok(top)
    }
}

#[async_trait]
impl YoutubeApi for YoutubeDataApi {
    async fn channel_stats(&self, channel_id: &str) -> PlatformResult<YoutubeChannelStats> {
        let channels: Page<StatisticsItem> = self
            .get("channels", &[("part", "statistics"), ("id", channel_id)])
            .await?;
        let Some(channel) = channels.items.into_iter().next() else {
            warn!("No YouTube data found for channel {}", channel_id);
            return Ok(YoutubeChannelStats::default());
        };

        let top_videos = self.top_videos(channel_id).await?;
        debug!(
            "YouTube channel {} has {} subscribers",
            channel_id, channel.statistics.subscriber_count
        );

        Ok(YoutubeChannelStats {
            subscribers: channel.statistics.subscriber_count,
            total_views: channel.statistics.view_count,
            video_count: channel.statistics.video_count,
            top_videos,
        })
    }
}
