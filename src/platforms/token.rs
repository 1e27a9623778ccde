use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

use super::errors::{PlatformError, PlatformResult};

pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const PLATFORM: &str = "spotify-accounts";
/// Refresh this long before the advertised expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> PlatformResult<String>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// OAuth client credentials grant with the token cached until shortly before
/// it expires.
pub struct ClientCredentialsProvider {
    client: Client,
    token_url: Url,
    client_id: String,
    client_secret: String,
    cached: Mutex<Option<CachedToken>>,
}

impl ClientCredentialsProvider {
    pub fn new(client: Client, client_id: String, client_secret: String) -> PlatformResult<Self> {
        Ok(Self::with_token_url(
            client,
            Url::parse(DEFAULT_TOKEN_URL)?,
            client_id,
            client_secret,
        ))
    }

    pub fn with_token_url(
        client: Client,
        token_url: Url,
        client_id: String,
        client_secret: String,
    ) -> Self {
        Self {
            client,
            token_url,
            client_id,
            client_secret,
            cached: Mutex::new(None),
        }
    }

    fn cached_token(&self) -> Option<String> {
        self.cached
            .lock()
            .as_ref()
            .filter(|token| Instant::now() < token.expires_at)
            .map(|token| token.value.clone())
    }

    async fn request_token(&self) -> PlatformResult<TokenResponse> {
        let response = self
            .client
            .post(self.token_url.clone())
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let response = super::check_status(PLATFORM, response)?;

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| PlatformError::Payload {
                platform: PLATFORM,
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialsProvider {
    async fn access_token(&self) -> PlatformResult<String> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        let token = self.request_token().await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
        debug!("Fetched access token valid for {:?}", lifetime);

        *self.cached.lock() = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> ClientCredentialsProvider {
        let url = Url::parse(&format!("{}/api/token", server.uri())).unwrap();
        ClientCredentialsProvider::with_token_url(
            Client::new(),
            url,
            "id".to_string(),
            "secret".to_string(),
        )
    }

    #[tokio::test]
    async fn test_token_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            // base64("id:secret")
            .and(header("authorization", "Basic aWQ6c2VjcmV0"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "abc",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider(&server);
        assert_eq!(provider.access_token().await.unwrap(), "abc");
        assert_eq!(provider.access_token().await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "short",
                "expires_in": 30
            })))
            .expect(2)
            .mount(&server)
            .await;

        // lifetime shorter than the margin is never reused
        let provider = provider(&server);
        provider.access_token().await.unwrap();
        provider.access_token().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let error = provider(&server).access_token().await.unwrap_err();
        assert!(matches!(error, PlatformError::Unauthorized { .. }));
    }
}
