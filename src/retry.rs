//! Fixed-delay retry wrapper shared by every upstream call
//!
//! Each attempt is independent: no backoff, no jitter, nothing carried
//! over from a failed attempt.

use crate::error::WatcherError;
use crate::Result;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio_retry::{strategy::FixedInterval, Retry};
use tracing::{error, info};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Terminal failure after every attempt was used
#[derive(Debug)]
pub struct RetryError {
    pub attempts: u32,
    pub last_error: WatcherError,
}

impl fmt::Display for RetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed after {} attempts: {}", self.attempts, self.last_error)
    }
}

/// Upstream name for per-attempt log lines, optionally scoped to one subject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label<'a> {
    name: &'a str,
    subject: Option<&'a str>,
}

impl<'a> Label<'a> {
    pub fn new(name: &'a str) -> Self {
        Self { name, subject: None }
    }

    pub fn for_subject(self, subject: &'a str) -> Self {
        Self {
            subject: Some(subject),
            ..self
        }
    }

    /// `"Tavily attempt 2 for BTC"`, or `"Whale Alert attempt 2"` without a subject
    pub fn attempt(&self, attempt: u32) -> String {
        match self.subject {
            Some(subject) => format!("{} attempt {} for {}", self.name, attempt, subject),
            None => format!("{} attempt {}", self.name, attempt),
        }
    }
}

impl<'a> From<&'a str> for Label<'a> {
    fn from(name: &'a str) -> Self {
        Self::new(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` below 1 is treated as 1.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// `max_attempts - 1` fixed sleeps; none after the last attempt.
    fn strategy(&self) -> std::iter::Take<FixedInterval> {
        FixedInterval::new(self.delay).take((self.max_attempts - 1) as usize)
    }

    /// Run `operation` until it succeeds or attempts run out.
    pub async fn run<'a, T, F, Fut>(
        &self,
        label: impl Into<Label<'a>>,
        mut operation: F,
    ) -> std::result::Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let label = label.into();
        let mut attempts: u32 = 0;

        let outcome = Retry::spawn(self.strategy(), || {
            attempts += 1;
            let attempt = attempts;
            let pending = operation();

            async move {
                match pending.await {
                    Ok(value) => {
                        info!("{} succeeded", label.attempt(attempt));
                        Ok(value)
                    }
                    Err(e) => {
                        error!("{} failed: {}", label.attempt(attempt), e);
                        Err(e)
                    }
                }
            }
        })
        .await;

        outcome.map_err(|last_error| RetryError {
            attempts,
            last_error,
        })
    }

    /// Like [`RetryPolicy::run`], mapping exhaustion to a caller-supplied value.
    pub async fn run_or_else<'a, T, F, Fut, D>(
        &self,
        label: impl Into<Label<'a>>,
        operation: F,
        fallback: D,
    ) -> T
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        D: FnOnce(RetryError) -> T,
    {
        match self.run(label, operation).await {
            Ok(value) => value,
            Err(exhausted) => fallback(exhausted),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn flaky(failures: u32, calls: &AtomicU32) -> Result<&'static str> {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        if n < failures {
            Err(WatcherError::api(500, "upstream down"))
        } else {
            Ok("ok")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_twice_then_succeeds() {
        let policy = RetryPolicy::default();
        let calls = &AtomicU32::new(0);
        let start = Instant::now();

        let result = policy
            .run("flaky", || async move { flaky(2, calls) })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // exactly two delays
        assert_eq!(start.elapsed(), DEFAULT_RETRY_DELAY * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_returns_fallback() {
        let policy = RetryPolicy::new(3, Duration::from_secs(5));
        let calls = &AtomicU32::new(0);
        let start = Instant::now();

        let value = policy
            .run_or_else(
                "broken",
                || async move { flaky(u32::MAX, calls) },
                |exhausted| {
                    assert_eq!(exhausted.attempts, 3);
                    "fallback"
                },
            )
            .await;

        assert_eq!(value, "fallback");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success_never_sleeps() {
        let policy = RetryPolicy::default();
        let calls = &AtomicU32::new(0);
        let start = Instant::now();

        let result = policy.run("steady", || async move { flaky(0, calls) }).await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        assert_eq!(policy.max_attempts(), 1);

        let calls = &AtomicU32::new(0);
        let result = tokio_test::block_on(policy.run("once", || async move { flaky(5, calls) }));

        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(exhausted.to_string().contains("upstream down"));
    }

    #[test]
    fn test_label_wording() {
        assert_eq!(Label::new("Whale Alert").attempt(1), "Whale Alert attempt 1");
        assert_eq!(
            Label::new("Tavily").for_subject("BTC").attempt(2),
            "Tavily attempt 2 for BTC"
        );
    }

    #[test]
    fn test_strategy_sleeps_between_attempts_only() {
        let delays: Vec<_> = RetryPolicy::new(3, Duration::from_secs(5)).strategy().collect();
        assert_eq!(delays, vec![Duration::from_secs(5); 2]);

        assert_eq!(RetryPolicy::new(1, Duration::from_secs(5)).strategy().count(), 0);
    }
}
