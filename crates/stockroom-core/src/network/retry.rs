//! Retry with exponential backoff and jitter for index service calls.

use crate::config::NetworkConfig;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first one).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Maximum delay cap.
    pub max_delay: Duration,
    /// Whether to add random jitter to delays.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: NetworkConfig::MAX_RETRIES,
            base_delay: NetworkConfig::RETRY_BASE_DELAY,
            max_delay: NetworkConfig::RETRY_MAX_DELAY,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retrying after the given (0-indexed) failed attempt.
    ///
    /// Doubles each attempt, capped at `max_delay`. Jitter scales the delay
    /// by a random factor in `0.5..1.5`, still capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let multiplier = 2f64.powi(attempt.min(30) as i32);
        let capped = (self.base_delay.as_secs_f64() * multiplier).min(self.max_delay.as_secs_f64());

        let secs = if self.jitter {
            let factor = rand::rng().random_range(0.5..1.5);
            (capped * factor).min(self.max_delay.as_secs_f64())
        } else {
            capped
        };

        Duration::from_secs_f64(secs)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// runs out of attempts. Returns the last result.
pub async fn retry_async<F, Fut, T, E>(
    config: &RetryConfig,
    operation: F,
    should_retry: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_async_with_hint(config, operation, should_retry, |_| None).await
}

/// Like [`retry_async`], but waits at least as long as `retry_after` asks
/// for an error. A requested wait beyond `max_delay` ends the retries and
/// returns that error.
pub async fn retry_async_with_hint<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
    should_retry: impl Fn(&E) -> bool,
    retry_after: impl Fn(&E) -> Option<Duration>,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("Operation succeeded after {} attempts", attempt + 1);
                }
                return Ok(value);
            }
            Err(e) if !should_retry(&e) => {
                debug!("Error is not retryable: {}", e);
                return Err(e);
            }
            Err(e) if attempt + 1 >= max_attempts => {
                warn!("All {} attempts exhausted. Last error: {}", max_attempts, e);
                return Err(e);
            }
            Err(e) => {
                let backoff = config.delay_for(attempt);
                let delay = match retry_after(&e) {
                    Some(wait) if wait > config.max_delay => {
                        warn!(
                            "Service asked to wait {:?}, longer than {:?}. Giving up: {}",
                            wait, config.max_delay, e
                        );
                        return Err(e);
                    }
                    Some(wait) => backoff.max(wait),
                    None => backoff,
                };
                warn!(
                    "Attempt {}/{} failed: {}. Retrying in {:?}",
                    attempt + 1,
                    max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_delay_doubles_without_jitter() {
        let config = RetryConfig::default()
            .with_base_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_secs(10))
            .with_jitter(false);

        assert_eq!(config.delay_for(0), Duration::from_millis(100));
        assert_eq!(config.delay_for(1), Duration::from_millis(200));
        assert_eq!(config.delay_for(2), Duration::from_millis(400));
    }

    #[test]
    fn test_delay_capped_at_max() {
        let config = RetryConfig::default()
            .with_base_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(3))
            .with_jitter(true);

        for _ in 0..20 {
            assert!(config.delay_for(5) <= Duration::from_secs(3));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let config = RetryConfig::default().with_max_attempts(3).with_jitter(false);

        let result: Result<&str, String> = retry_async(
            &config,
            || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err("boom".to_string())
                    } else {
                        Ok("done")
                    }
                }
            },
            |_| true,
        )
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_non_retryable() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), String> = retry_async(
            &RetryConfig::default(),
            || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err("bad request".to_string()) }
            },
            |e: &String| !e.contains("bad"),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), String> = retry_async(
            &RetryConfig::default().with_max_attempts(2),
            || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err("down".to_string()) }
            },
            |_| true,
        )
        .await;

        assert_eq!(result, Err("down".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_at_least_retry_after() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let config = RetryConfig::default()
            .with_max_attempts(2)
            .with_base_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_secs(10))
            .with_jitter(false);
        let started = tokio::time::Instant::now();

        let result: Result<&str, String> = retry_async_with_hint(
            &config,
            || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err("slow down".to_string())
                    } else {
                        Ok("done")
                    }
                }
            },
            |_| true,
            |_| Some(Duration::from_secs(3)),
        )
        .await;

        assert_eq!(result, Ok("done"));
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_beyond_max_delay_gives_up() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let config = RetryConfig::default()
            .with_max_attempts(3)
            .with_max_delay(Duration::from_secs(5));

        let result: Result<(), String> = retry_async_with_hint(
            &config,
            || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err("slow down".to_string()) }
            },
            |_| true,
            |_| Some(Duration::from_secs(60)),
        )
        .await;

        assert_eq!(result, Err("slow down".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
