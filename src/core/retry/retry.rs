use super::types::*;
use super::utils::*;
use crate::scrapers::FetchError;
use std::time::Duration;

pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

impl Default for RetryPolicy {
    fn default() -> Self {
        let mut conditions: Vec<RetryCondition> = RETRYABLE_STATUSES
            .iter()
            .map(|status| RetryCondition::StatusCode(*status))
            .collect();
        conditions.push(RetryCondition::Timeout);
        conditions.push(RetryCondition::ConnectionFailure);

        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_policy: BackoffPolicy::default(),
            conditions,
        }
    }
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&mut self, category: &RetryCategory) {
        *self.counts.entry(category.clone()).or_insert(0) += 1;
        self.total_retries += 1;
    }
}

impl RetryPolicy {
    /// A policy that never retries. Useful for callers that handle failures themselves.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            conditions: Vec::new(),
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_backoff(mut self, backoff_policy: BackoffPolicy) -> Self {
        self.backoff_policy = backoff_policy;
        self
    }

    pub fn with_conditions(mut self, conditions: Vec<RetryCondition>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.conditions
            .iter()
            .any(|condition| status_condition_should_apply(condition, status))
    }

    /// Decides whether a completed response should be retried, updating `state` when it should.
    pub fn should_retry_status(
        &self,
        status: u16,
        state: &mut RetryState,
    ) -> Option<(RetryCategory, Duration)> {
        if state.total_retries >= self.max_retries || !self.is_retryable_status(status) {
            return None;
        }

        let category = category_for_status(status);
        let delay = calculate_delay(self, state.total_retries);
        state.register(&category);
        Some((category, delay))
    }

    /// Decides whether a transport-level failure should be retried.
    pub fn should_retry_error(
        &self,
        error: &FetchError,
        state: &mut RetryState,
    ) -> Option<(RetryCategory, Duration)> {
        if state.total_retries >= self.max_retries {
            return None;
        }

        let applies = self
            .conditions
            .iter()
            .any(|condition| error_condition_should_apply(condition, error));
        if !applies {
            return None;
        }

        let category = category_for_error(error);
        let delay = calculate_delay(self, state.total_retries);
        state.register(&category);
        Some((category, delay))
    }

    pub fn calculate_delay(&self, attempt: usize) -> Duration {
        calculate_delay(self, attempt)
    }
}
