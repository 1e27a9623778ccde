//! Circuit breaker guarding the scraped listeners page.
//!
//! ```text
//! Closed    -> Open:      consecutive_failures >= failure_threshold
//! Open      -> HalfOpen:  first can_proceed() after recovery_timeout
//! HalfOpen  -> Closed:    trial attempt succeeds
//! HalfOpen  -> Open:      trial attempt fails (opened_at reset)
//! ```
//!
//! One breaker is shared by every scrape attempt of a run. The state lives
//! behind a mutex so the breaker can be shared by reference or `Arc`.

use log::{info, warn};
use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    /// Whether an attempt may be made now.
    ///
    /// An open breaker whose recovery timeout has elapsed moves to half-open and
    /// admits that single caller; everyone else is refused until the trial's
    /// outcome is recorded.
    pub fn can_proceed(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => false,
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|opened_at| opened_at.elapsed())
                    .unwrap_or_default();
                if elapsed > self.config.recovery_timeout {
                    inner.state = CircuitState::HalfOpen;
                    info!(
                        "Circuit breaker half-open after {:?}, allowing one trial attempt",
                        elapsed
                    );
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::Closed {
            info!("Circuit breaker closed after successful attempt");
        }
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.consecutive_failures += 1;

        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                warn!("Circuit breaker re-opened after failed trial attempt");
            }
            CircuitState::Open => {
                inner.opened_at = Some(Instant::now());
            }
            CircuitState::Closed => {
                if inner.consecutive_failures >= self.config.failure_threshold {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                    warn!(
                        "Circuit breaker opened after {} failures",
                        inner.consecutive_failures
                    );
                }
            }
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.inner.lock().consecutive_failures
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: u32, recovery_secs: u64) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: threshold,
            recovery_timeout: Duration::from_secs(recovery_secs),
        })
    }

    #[test]
    fn test_closed_always_proceeds() {
        let breaker = breaker(3, 300);
        assert!(breaker.can_proceed());
        assert!(breaker.can_proceed());
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_at_threshold() {
        let breaker = breaker(3, 300);
        breaker.record_failure();
        breaker.record_failure();
        assert!(breaker.can_proceed());

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.can_proceed());
        assert_eq!(breaker.consecutive_failures(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stays_open_before_recovery_timeout() {
        let breaker = breaker(1, 300);
        breaker.record_failure();

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(!breaker.can_proceed());
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_admits_exactly_one_trial() {
        let breaker = breaker(3, 300);
        for _ in 0..3 {
            breaker.record_failure();
        }

        tokio::time::advance(Duration::from_secs(301)).await;
        assert!(breaker.can_proceed());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert!(!breaker.can_proceed());
        assert!(!breaker.can_proceed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_success_closes() {
        let breaker = breaker(2, 10);
        breaker.record_failure();
        breaker.record_failure();

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(breaker.can_proceed());
        breaker.record_success();

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(), 0);
        assert!(breaker.can_proceed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_failure_reopens_with_fresh_timer() {
        let breaker = breaker(2, 10);
        breaker.record_failure();
        breaker.record_failure();

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(breaker.can_proceed());
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(!breaker.can_proceed());

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(breaker.can_proceed());
    }

    #[test]
    fn test_success_resets_failure_count() {
        let breaker = breaker(3, 300);
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        breaker.record_failure();
        breaker.record_failure();

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(), 2);
    }
}
