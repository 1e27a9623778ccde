use crate::core::retry::{BackoffPolicy, RetryCategory, RetryCondition, RetryPolicy, RetryState};
use crate::http::PageRequest;
use crate::scrapers::{FetchError, MockFailure, MockResponse, MockScraper, Scraper};
use std::time::Duration;
use url::Url;

fn policy(max_retries: usize, backoff_policy: BackoffPolicy) -> RetryPolicy {
    RetryPolicy::default()
        .with_max_retries(max_retries)
        .with_initial_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_secs(1))
        .with_backoff(backoff_policy)
}

fn request() -> PageRequest {
    PageRequest::new(Url::parse("https://example.com/artist/1").unwrap())
}

#[tokio::test]
async fn test_rate_limit_retry() {
    let responses = vec![
        MockResponse::status(429, "Rate limited"),
        MockResponse::ok("Success"),
    ];

    let scraper = MockScraper::new(policy(3, BackoffPolicy::Constant), responses);
    let response = scraper.fetch(request()).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "Success");
    assert_eq!(response.retry_count, 1);
    assert_eq!(
        response.retry_history.get(&RetryCategory::RateLimit),
        Some(&1)
    );
}

#[tokio::test]
async fn test_exponential_backoff() {
    let responses = vec![
        MockResponse::status(502, "Bad gateway"),
        MockResponse::status(502, "Bad gateway"),
        MockResponse::ok("Success"),
    ];

    let start = std::time::Instant::now();
    let scraper = MockScraper::new(
        policy(3, BackoffPolicy::Exponential { factor: 2.0 }),
        responses,
    );
    let response = scraper.fetch(request()).await.unwrap();

    let elapsed = start.elapsed();
    assert_eq!(response.status, 200);
    assert_eq!(response.retry_count, 2);
    assert_eq!(
        response.retry_history.get(&RetryCategory::ServerError),
        Some(&2)
    );
    // Should wait ~300ms total (100ms + 200ms)
    assert!(elapsed >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_max_retries_exceeded() {
    let responses = vec![MockResponse::status(429, "Rate limited")];

    let scraper = MockScraper::new(policy(2, BackoffPolicy::Constant), responses);
    let error = scraper.fetch(request()).await.unwrap_err();

    assert!(matches!(error, FetchError::Status { status: 429, .. }));
    assert_eq!(scraper.request_count(), 3);
}

#[tokio::test]
async fn test_connection_failures_are_retried() {
    let responses = vec![
        MockResponse::failure(MockFailure::Connection),
        MockResponse::failure(MockFailure::Timeout),
        MockResponse::ok("Success"),
    ];

    let scraper = MockScraper::new(policy(3, BackoffPolicy::Constant), responses);
    let response = scraper.fetch(request()).await.unwrap();

    assert_eq!(response.retry_count, 2);
    assert_eq!(
        response.retry_history.get(&RetryCategory::Connection),
        Some(&1)
    );
    assert_eq!(
        response.retry_history.get(&RetryCategory::Timeout),
        Some(&1)
    );
}

#[tokio::test]
async fn test_permanent_status_is_not_retried() {
    for status in [401, 403, 404] {
        let scraper = MockScraper::new(
            policy(3, BackoffPolicy::Constant),
            vec![MockResponse::status(status, "nope")],
        );
        let error = scraper.fetch(request()).await.unwrap_err();

        assert!(matches!(error, FetchError::Status { status: s, .. } if s == status));
        assert_eq!(scraper.request_count(), 1);
    }
}

#[tokio::test]
async fn test_no_retry_policy() {
    let scraper = MockScraper::new(
        RetryPolicy::none(),
        vec![MockResponse::failure(MockFailure::Timeout)],
    );
    let error = scraper.fetch(request()).await.unwrap_err();

    assert!(matches!(error, FetchError::Timeout(_)));
    assert_eq!(scraper.request_count(), 1);
}

#[test]
fn test_delay_calculation() {
    let exponential = policy(5, BackoffPolicy::Exponential { factor: 2.0 });
    assert_eq!(exponential.calculate_delay(0), Duration::from_millis(100));
    assert_eq!(exponential.calculate_delay(1).as_millis(), 200);
    assert_eq!(exponential.calculate_delay(2).as_millis(), 400);
    assert_eq!(exponential.calculate_delay(10), Duration::from_secs(1));

    let linear = policy(5, BackoffPolicy::Linear);
    assert_eq!(linear.calculate_delay(3).as_millis(), 300);
}

#[test]
fn test_large_attempts_saturate_at_max_delay() {
    let exponential = policy(5, BackoffPolicy::Exponential { factor: 2.0 });
    assert_eq!(exponential.calculate_delay(200), Duration::from_secs(1));
    assert_eq!(exponential.calculate_delay(usize::MAX), Duration::from_secs(1));

    let linear = policy(5, BackoffPolicy::Linear);
    assert_eq!(linear.calculate_delay(usize::MAX), Duration::from_secs(1));
}

#[test]
fn test_custom_conditions_replace_defaults() {
    let policy = RetryPolicy::default().with_conditions(vec![RetryCondition::StatusCode(418)]);
    let mut state = RetryState::new();

    assert!(policy.should_retry_status(503, &mut state).is_none());
    let (category, _) = policy.should_retry_status(418, &mut state).unwrap();
    assert_eq!(category, RetryCategory::Custom("status_418".to_string()));
    assert_eq!(state.total_retries, 1);
}
