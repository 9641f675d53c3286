//! State reconciliation
//!
//! Polls a refresh function until the observed state label reaches one of
//! the target labels. The loop fails fast on a label that is neither pending
//! nor target, surfaces refresh errors unchanged, and gives up once the
//! deadline measured from the first poll has passed.

use crate::error::{CloudError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Poll interval configuration (bounded exponential backoff)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Wait before the first poll; not counted against the timeout
    pub delay: Duration,
    /// First interval between polls, and the floor for every later one
    pub min_interval: Duration,
    /// Ceiling for the interval between polls
    pub max_interval: Duration,
    /// Growth factor applied after every pending poll
    pub multiplier: u32,
    /// Overall bound, measured from the first poll
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            min_interval: Duration::from_secs(3),
            max_interval: Duration::from_secs(10),
            multiplier: 2,
            timeout: crate::provider::DEFAULT_TIMEOUT,
        }
    }
}

impl PollConfig {
    /// Interval to wait after the given number of pending polls
    pub fn interval_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1).checked_pow(attempt).unwrap_or(u32::MAX);
        let ceiling = self.max_interval.max(self.min_interval);
        self.min_interval
            .saturating_mul(factor)
            .clamp(self.min_interval, ceiling)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Waits for a remote object to settle into a target state
#[derive(Debug, Clone)]
pub struct StateWaiter {
    pending: Vec<String>,
    target: Vec<String>,
    config: PollConfig,
}

impl StateWaiter {
    pub fn new(pending: &[&str], target: &[&str]) -> Self {
        Self {
            pending: pending.iter().map(|s| s.to_string()).collect(),
            target: target.iter().map(|s| s.to_string()).collect(),
            config: PollConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PollConfig) -> Self {
        self.config = config;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.config.delay = delay;
        self
    }

    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.config.min_interval = interval;
        self
    }

    pub fn max_interval(mut self, interval: Duration) -> Self {
        self.config.max_interval = interval;
        self
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll `refresh` until it reports a target state
    ///
    /// `refresh` returns the current object together with its state label.
    /// The object from the first poll that reports a target label is returned.
    pub async fn wait_for_state<T, F, Fut>(&self, mut refresh: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(T, String)>>,
    {
        if let Some(overlap) = self.pending.iter().find(|s| self.target.contains(*s)) {
            return Err(CloudError::Validation(format!(
                "state '{}' cannot be both pending and target",
                overlap
            )));
        }
        if self.config.min_interval.is_zero() {
            return Err(CloudError::Validation(
                "poll interval must be greater than zero".to_string(),
            ));
        }

        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        let started = Instant::now();
        let deadline = started.checked_add(self.config.timeout);
        let mut attempt = 0;

        loop {
            let (object, state) = refresh().await?;

            if self.target.contains(&state) {
                tracing::debug!(
                    "Reached state '{}' after {:?}",
                    state,
                    started.elapsed()
                );
                return Ok(object);
            }

            if !self.pending.contains(&state) {
                return Err(CloudError::UnexpectedState {
                    state,
                    expected: self.target.clone(),
                });
            }

            let now = Instant::now();
            let remaining = match deadline {
                Some(deadline) if now >= deadline => {
                    return Err(CloudError::Timeout {
                        last_state: state,
                        target: self.target.clone(),
                        timeout: self.config.timeout,
                    });
                }
                Some(deadline) => deadline - now,
                None => Duration::MAX,
            };

            let wait = self.config.interval_for_attempt(attempt).min(remaining);
            tracing::debug!("State '{}' is pending, checking again in {:?}", state, wait);
            sleep(wait).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::collections::VecDeque;

    fn scripted(states: &[&str]) -> VecDeque<String> {
        states.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_interval_calculation() {
        let config = PollConfig::default();

        assert_eq!(config.interval_for_attempt(0), Duration::from_secs(3));
        assert_eq!(config.interval_for_attempt(1), Duration::from_secs(6));
        assert_eq!(config.interval_for_attempt(2), Duration::from_secs(10)); // capped at max
        assert_eq!(config.interval_for_attempt(40), Duration::from_secs(10));
        assert_eq!(config.interval_for_attempt(u32::MAX), Duration::from_secs(10));

        let flat = PollConfig {
            multiplier: 0,
            ..PollConfig::default()
        };
        assert_eq!(flat.interval_for_attempt(5), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_target_object_after_two_intervals() {
        let mut states = scripted(&["creating", "creating", "active"]);
        let polls = Cell::new(0);
        let waiter = StateWaiter::new(&["creating"], &["active", "inactive"]);

        let start = Instant::now();
        let result = waiter
            .wait_for_state(|| {
                polls.set(polls.get() + 1);
                let id = format!("srv-{}", polls.get());
                let state = states.pop_front().unwrap();
                async move { Ok((id, state)) }
            })
            .await
            .unwrap();

        assert_eq!(result, "srv-3");
        assert_eq!(polls.get(), 3);
        // 3s, then 6s
        assert_eq!(start.elapsed(), Duration::from_secs(9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_naming_last_state() {
        let waiter =
            StateWaiter::new(&["creating"], &["active"]).timeout(Duration::from_secs(20));

        let start = Instant::now();
        let err = waiter
            .wait_for_state(|| async { Ok(((), "creating".to_string())) })
            .await
            .unwrap_err();

        assert!(matches!(
            &err,
            CloudError::Timeout { last_state, .. } if last_state == "creating"
        ));
        assert!(err.to_string().contains("creating"));
        assert_eq!(start.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_state_fails_without_waiting() {
        let waiter = StateWaiter::new(&["creating"], &["active"]);

        let start = Instant::now();
        let err = waiter
            .wait_for_state(|| async { Ok(((), "error".to_string())) })
            .await
            .unwrap_err();

        assert!(matches!(
            &err,
            CloudError::UnexpectedState { state, .. } if state == "error"
        ));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_error_is_surfaced_unchanged() {
        let polls = Cell::new(0);
        let waiter = StateWaiter::new(&["deleting"], &["deleted"]);

        let err = waiter
            .wait_for_state(|| {
                polls.set(polls.get() + 1);
                async {
                    Err::<((), String), _>(CloudError::api(
                        "Error retrieving server details",
                        std::io::Error::other("boom"),
                    ))
                }
            })
            .await
            .unwrap_err();

        assert_eq!(polls.get(), 1);
        assert_eq!(err.to_string(), "Error retrieving server details");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "boom");
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_delay_is_not_counted_against_timeout() {
        let mut states = scripted(&["creating", "active"]);
        let waiter = StateWaiter::new(&["creating"], &["active"])
            .delay(Duration::from_secs(10))
            .timeout(Duration::from_secs(5));

        let start = Instant::now();
        waiter
            .wait_for_state(|| {
                let state = states.pop_front().unwrap();
                async move { Ok(((), state)) }
            })
            .await
            .unwrap();

        assert_eq!(start.elapsed(), Duration::from_secs(13));
    }

    #[tokio::test]
    async fn test_overlapping_pending_and_target_is_rejected() {
        let waiter = StateWaiter::new(&["active"], &["active"]);
        let err = waiter
            .wait_for_state(|| async { Ok(((), "active".to_string())) })
            .await
            .unwrap_err();

        assert!(matches!(err, CloudError::Validation(_)));
    }

    #[tokio::test]
    async fn test_zero_poll_interval_is_rejected() {
        let polls = Cell::new(0);
        let waiter = StateWaiter::new(&["creating"], &["active"]).min_interval(Duration::ZERO);

        let err = waiter
            .wait_for_state(|| {
                polls.set(polls.get() + 1);
                async { Ok(((), "creating".to_string())) }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, CloudError::Validation(_)), "got {err:?}");
        assert_eq!(polls.get(), 0);
    }
}
