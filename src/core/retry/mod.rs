mod retry;
mod types;
mod utils;

pub use retry::RETRYABLE_STATUSES;
pub use types::{BackoffPolicy, RetryCategory, RetryCondition, RetryPolicy, RetryState};

#[cfg(test)]
mod tests;
