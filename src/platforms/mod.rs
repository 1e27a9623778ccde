mod errors;
pub mod spotify;
pub mod token;
pub mod youtube;

pub use errors::{PlatformError, PlatformResult};
pub use spotify::{SpotifyApi, SpotifyArtistMetrics, SpotifyWebApi, TopTrack};
pub use token::{ClientCredentialsProvider, TokenProvider};
pub use youtube::{TopVideo, YoutubeApi, YoutubeChannelStats, YoutubeDataApi};

use reqwest::Response;
use url::Url;

/// Joins `path` onto `base`, treating `base` as a directory.
pub(crate) fn endpoint(base: &Url, path: &str) -> PlatformResult<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let directory = format!("{}/", base.path());
        base.set_path(&directory);
    }
    Ok(base.join(path)?)
}

pub(crate) fn check_status(platform: &'static str, response: Response) -> PlatformResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(PlatformError::from_status(platform, status.as_u16()))
    }
}
