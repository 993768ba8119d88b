// src/core/scanner/retry.rs

use std::time::Duration;

use tracing::{debug, warn};

use super::prober::Prober;
use super::scheduler::StopSignal;
use crate::config::{Config, DEFAULT_BACKOFF_BASE, DEFAULT_MAX_RETRIES, MAX_BACKOFF};
use crate::core::models::{Candidate, ProbeResult, Target};

/// Decides whether a failed attempt is tried again and how long to wait first.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub max_backoff: Duration,
    stop: Option<StopSignal>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_BACKOFF_BASE)
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base: Duration) -> Self {
        Self {
            max_retries,
            backoff_base,
            max_backoff: MAX_BACKOFF,
            stop: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            max_backoff: config.max_backoff,
            ..Self::new(config.max_retries, config.backoff_base)
        }
    }

    /// Stops starting new attempts once `stop` is raised. The latest outcome
    /// then becomes final.
    pub fn bound_to(mut self, stop: StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Delay before retry number `retry` (0-based): `base * 2^retry`, capped.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.backoff_base
            .checked_mul(factor)
            .map_or(self.max_backoff, |d| d.min(self.max_backoff))
    }

    /// Probes `candidate`, retrying timeouts and network errors.
    ///
    /// A received response of any status ends the loop immediately. After
    /// `max_retries` extra attempts the last failure is returned as final.
    ///
    /// # Arguments
    /// * `prober` - Performs the single attempts.
    /// * `target` - Base URL the candidate is resolved against.
    /// * `candidate` - Path being probed.
    /// * `timeout` - Per-attempt timeout handed to the prober.
    ///
    /// # Returns
    /// A `ProbeResult` recording the final outcome and the number of attempts made.
    pub async fn execute_with_retry<P>(
        &self,
        prober: &P,
        target: &Target,
        candidate: Candidate,
        timeout: Duration,
    ) -> ProbeResult
    where
        P: Prober + ?Sized,
    {
        let mut outcome = prober.probe(target, &candidate, timeout).await;
        let mut attempts_made = 1;

        for retry in 0..self.max_retries {
            if !outcome.is_retryable() {
                break;
            }
            if self.stop.as_ref().is_some_and(StopSignal::is_raised) {
                debug!(candidate = %candidate, "Stop requested, not retrying.");
                break;
            }

            let delay = self.backoff_for(retry);
            debug!(
                candidate = %candidate,
                kind = outcome.as_ref(),
                delay_ms = delay.as_millis() as u64,
                "Retrying after backoff."
            );
            tokio::time::sleep(delay).await;

            outcome = prober.probe(target, &candidate, timeout).await;
            attempts_made += 1;
        }

        if outcome.is_retryable() {
            warn!(candidate = %candidate, kind = outcome.as_ref(), attempts = attempts_made, "Giving up on candidate.");
        }

        ProbeResult {
            candidate,
            final_outcome: outcome,
            attempts_made,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ProbeOutcome;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails with `failure` for the first `failures` calls, then answers with `status`.
    struct FlakyProber {
        failures: u32,
        failure: ProbeOutcome,
        status: u16,
        calls: AtomicU32,
    }

    impl FlakyProber {
        fn new(failures: u32, status: u16) -> Self {
            Self { failures, failure: ProbeOutcome::Timeout, status, calls: AtomicU32::new(0) }
        }

        fn unreachable(failures: u32, status: u16) -> Self {
            Self {
                failure: ProbeOutcome::NetworkError { cause: "connection refused".into() },
                ..Self::new(failures, status)
            }
        }
    }

    #[async_trait]
    impl Prober for FlakyProber {
        async fn probe(&self, _: &Target, _: &Candidate, _: Duration) -> ProbeOutcome {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                self.failure.clone()
            } else {
                ProbeOutcome::Success { status_code: self.status, elapsed: Duration::from_millis(1) }
            }
        }
    }

    fn target() -> Target {
        Target::parse("http://example.test").unwrap()
    }

    fn candidate() -> Candidate {
        Candidate::new("admin").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_when_retries_cover_failures() {
        let prober = FlakyProber::new(2, 200);
        let policy = RetryPolicy::new(3, Duration::from_millis(500));

        let result = policy.execute_with_retry(&prober, &target(), candidate(), Duration::from_secs(1)).await;
        assert_eq!(result.final_outcome.status_code(), Some(200));
        assert_eq!(result.attempts_made, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_with_last_timeout() {
        let prober = FlakyProber::new(5, 200);
        let policy = RetryPolicy::new(2, Duration::from_millis(500));

        let result = policy.execute_with_retry(&prober, &target(), candidate(), Duration::from_secs(1)).await;
        assert_eq!(result.final_outcome, ProbeOutcome::Timeout);
        assert_eq!(result.attempts_made, 3);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn network_errors_are_retried() {
        let prober = FlakyProber::unreachable(1, 403);
        let policy = RetryPolicy::new(2, Duration::from_millis(500));

        let result = policy.execute_with_retry(&prober, &target(), candidate(), Duration::from_secs(1)).await;
        assert_eq!(result.final_outcome.status_code(), Some(403));
        assert_eq!(result.attempts_made, 2);

        let down = FlakyProber::unreachable(10, 200);
        let result = policy.execute_with_retry(&down, &target(), candidate(), Duration::from_secs(1)).await;
        assert!(matches!(result.final_outcome, ProbeOutcome::NetworkError { ref cause } if cause == "connection refused"));
        assert_eq!(result.attempts_made, 3);
        assert_eq!(down.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn server_errors_are_not_retried() {
        let prober = FlakyProber::new(0, 500);
        let policy = RetryPolicy::new(4, Duration::from_millis(500));

        let result = policy.execute_with_retry(&prober, &target(), candidate(), Duration::from_secs(1)).await;
        assert_eq!(result.final_outcome.status_code(), Some(500));
        assert_eq!(result.attempts_made, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_sleeps_between_attempts() {
        let prober = FlakyProber::new(2, 200);
        let policy = RetryPolicy::new(2, Duration::from_millis(500));

        let started = tokio::time::Instant::now();
        policy.execute_with_retry(&prober, &target(), candidate(), Duration::from_secs(1)).await;
        // 500ms + 1000ms of backoff, on the paused clock.
        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(1500) && waited < Duration::from_millis(1600));
    }

    #[tokio::test(start_paused = true)]
    async fn raised_stop_prevents_further_attempts() {
        let prober = FlakyProber::new(5, 200);
        let stop = StopSignal::new();
        stop.raise();
        let policy = RetryPolicy::new(3, Duration::from_millis(500)).bound_to(stop);

        let result = policy.execute_with_retry(&prober, &target(), candidate(), Duration::from_secs(1)).await;
        assert_eq!(result.final_outcome, ProbeOutcome::Timeout);
        assert_eq!(result.attempts_made, 1);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(10, Duration::from_millis(500));
        assert_eq!(policy.backoff_for(0), Duration::from_millis(500));
        assert_eq!(policy.backoff_for(1), Duration::from_secs(1));
        assert_eq!(policy.backoff_for(3), Duration::from_secs(4));
        assert_eq!(policy.backoff_for(6), Duration::from_secs(30));
        assert_eq!(policy.backoff_for(40), Duration::from_secs(30));
    }
}
