use crate::core::retry::RetryPolicy;
use crate::http::{PageRequest, PageResponse};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::sleep;

use super::errors::{FetchError, FetchResult};
use super::Scraper;

#[derive(Clone, Debug)]
pub enum MockFailure {
    Timeout,
    Connection,
}

#[derive(Clone, Debug)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub delay: Option<std::time::Duration>,
    pub failure: Option<MockFailure>,
}

impl MockResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: None,
            failure: None,
        }
    }

    pub fn failure(failure: MockFailure) -> Self {
        Self {
            status: 0,
            body: String::new(),
            delay: None,
            failure: Some(failure),
        }
    }
}

/// Scraper that replays a scripted list of responses, cycling when exhausted,
/// and records every request it was asked to make.
#[derive(Clone)]
pub struct MockScraper {
    retry_policy: RetryPolicy,
    responses: Arc<Vec<MockResponse>>,
    current_response: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<PageRequest>>>,
}

impl MockScraper {
    pub fn new(retry_policy: RetryPolicy, responses: Vec<MockResponse>) -> Self {
        Self {
            retry_policy,
            responses: Arc::new(responses),
            current_response: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Scraper for MockScraper {
    async fn fetch_single(&self, request: PageRequest) -> FetchResult<PageResponse> {
        self.requests.lock().push(request.clone());

        if self.responses.is_empty() {
            return Err(FetchError::Connection("no scripted responses".to_string()));
        }
        let index = self.current_response.fetch_add(1, Ordering::SeqCst);
        let response = &self.responses[index % self.responses.len()];

        if let Some(delay) = response.delay {
            sleep(delay).await;
        }

        match response.failure {
            Some(MockFailure::Timeout) => {
                return Err(FetchError::Timeout(format!("{} timed out", request.url)))
            }
            Some(MockFailure::Connection) => {
                return Err(FetchError::Connection(format!(
                    "{} refused connection",
                    request.url
                )))
            }
            None => {}
        }

        Ok(PageResponse {
            url: request.url,
            status: response.status,
            headers: HashMap::new(),
            body: response.body.clone(),
            timestamp: Utc::now(),
            retry_count: 0,
            retry_history: HashMap::new(),
        })
    }

    fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }
}
