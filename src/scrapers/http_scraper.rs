use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, ClientBuilder};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::errors::{FetchError, FetchResult};
use super::Scraper;
use crate::core::retry::RetryPolicy;
use crate::http::{PageRequest, PageResponse};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";
pub const DEFAULT_MAX_IN_FLIGHT: usize = 10;

/// Pooled `reqwest` client with a cap on requests in flight.
///
/// The client (and its connection pool) is shared by every clone, so one
/// scraper serves a whole run. Each request holds a semaphore permit until its
/// body has been read; the permit drops with the request on every exit path.
#[derive(Clone)]
pub struct HttpScraper {
    client: Client,
    retry_policy: RetryPolicy,
    slots: Arc<Semaphore>,
}

impl HttpScraper {
    pub fn new() -> FetchResult<Self> {
        Self::with_policy(RetryPolicy::default(), DEFAULT_MAX_IN_FLIGHT)
    }

    pub fn with_policy(retry_policy: RetryPolicy, max_in_flight: usize) -> FetchResult<Self> {
        let max_in_flight = max_in_flight.max(1);
        let client = ClientBuilder::new()
            .user_agent(DEFAULT_USER_AGENT)
            .pool_max_idle_per_host(max_in_flight)
            .build()?;

        Ok(Self {
            client,
            retry_policy,
            slots: Arc::new(Semaphore::new(max_in_flight)),
        })
    }

    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    fn extract_headers(response: &reqwest::Response) -> HashMap<String, String> {
        response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|val| (k.to_string(), val.to_string())))
            .collect()
    }
}

#[async_trait]
impl Scraper for HttpScraper {
    async fn fetch_single(&self, request: PageRequest) -> FetchResult<PageResponse> {
        let _slot = self
            .slots
            .acquire()
            .await
            .map_err(|_| FetchError::PoolClosed)?;

        let mut req = self.client.get(request.url.clone()).headers(request.headers);
        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        let start_time = Utc::now();
        let response = req.send().await?;
        let status = response.status().as_u16();
        let headers = Self::extract_headers(&response);

        // decoded by the declared charset, UTF-8 (lossy) otherwise
        let body = response.text().await?;

        Ok(PageResponse {
            url: request.url,
            status,
            headers,
            body,
            timestamp: start_time,
            retry_count: 0,
            retry_history: HashMap::new(),
        })
    }

    fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }
}
