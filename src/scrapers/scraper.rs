use super::errors::{FetchError, FetchResult};
use crate::core::retry::{RetryPolicy, RetryState};
use crate::http::{PageRequest, PageResponse};
use async_trait::async_trait;
use log::{debug, info, trace, warn};
use tokio::time::sleep;

#[async_trait]
pub trait Scraper: Send + Sync {
    /// One request, no retries. Non-2xx statuses come back as `Ok` so the
    /// retry loop can inspect them.
    async fn fetch_single(&self, request: PageRequest) -> FetchResult<PageResponse>;
    fn retry_policy(&self) -> &RetryPolicy;

    async fn fetch(&self, request: PageRequest) -> FetchResult<PageResponse> {
        let mut state = RetryState::new();

        loop {
            info!("Fetching URL: {}", request.url);
            let (category, delay) = match self.fetch_single(request.clone()).await {
                Ok(response) => {
                    debug!(
                        "Received response: status={}, body_length={}",
                        response.status,
                        response.body.len()
                    );
                    match self
                        .retry_policy()
                        .should_retry_status(response.status, &mut state)
                    {
                        Some(retry) => retry,
                        None => return finish(response, state),
                    }
                }
                Err(error) => match self.retry_policy().should_retry_error(&error, &mut state) {
                    Some(retry) => {
                        debug!("Transient failure for {}: {}", request.url, error);
                        retry
                    }
                    None => {
                        warn!("Request failed for URL: {} ({})", request.url, error);
                        return Err(error);
                    }
                },
            };

            warn!(
                "Retry triggered for URL: {} (category={:?}, attempt={}/{}, delay={:?})",
                request.url,
                category,
                state.total_retries,
                self.retry_policy().max_retries,
                delay
            );
            sleep(delay).await;
        }
    }
}

fn finish(response: PageResponse, state: RetryState) -> FetchResult<PageResponse> {
    info!(
        "Request completed for URL: {} (total_retries={}, status={})",
        response.url, state.total_retries, response.status
    );
    debug!("Retry history for {}: {:?}", response.url, state.counts);

    if !response.is_success() {
        return Err(FetchError::Status {
            status: response.status,
            url: response.url,
        });
    }

    trace!("Response content length: {} bytes", response.body.len());
    Ok(PageResponse {
        retry_count: state.total_retries,
        retry_history: state.counts,
        ..response
    })
}
