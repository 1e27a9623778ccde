use super::types::*;
use crate::scrapers::FetchError;
use std::time::Duration;

pub fn status_condition_should_apply(condition: &RetryCondition, status: u16) -> bool {
    matches!(condition, RetryCondition::StatusCode(code) if *code == status)
}

pub fn error_condition_should_apply(condition: &RetryCondition, error: &FetchError) -> bool {
    match (condition, error) {
        (RetryCondition::Timeout, FetchError::Timeout(_)) => true,
        (RetryCondition::ConnectionFailure, FetchError::Connection(_)) => true,
        (RetryCondition::StatusCode(code), FetchError::Status { status, .. }) => code == status,
        _ => false,
    }
}

pub fn category_for_status(status: u16) -> RetryCategory {
    match status {
        429 => RetryCategory::RateLimit,
        500..=599 => RetryCategory::ServerError,
        other => RetryCategory::Custom(format!("status_{}", other)),
    }
}

pub fn category_for_error(error: &FetchError) -> RetryCategory {
    match error {
        FetchError::Timeout(_) => RetryCategory::Timeout,
        FetchError::Connection(_) => RetryCategory::Connection,
        FetchError::Status { status, .. } => category_for_status(*status),
        other => RetryCategory::Custom(other.to_string()),
    }
}

pub fn calculate_delay(policy: &RetryPolicy, attempt: usize) -> Duration {
    if attempt == 0 {
        return policy.initial_delay;
    }

    let scale = match policy.backoff_policy {
        BackoffPolicy::Constant => 1.0,
        BackoffPolicy::Linear => attempt as f64,
        BackoffPolicy::Exponential { factor } => {
            f64::from(factor).powi(attempt.min(i32::MAX as usize) as i32)
        }
    };

    let nanos = policy.initial_delay.as_nanos() as f64 * scale;
    // overflowing or non-finite delays saturate at the cap
    if !nanos.is_finite() || nanos >= policy.max_delay.as_nanos() as f64 {
        return policy.max_delay;
    }
    Duration::from_nanos(nanos as u64)
}
