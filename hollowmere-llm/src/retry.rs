use std::time::Duration;

use tracing::warn;

use crate::error::LlmError;

/// Exponential backoff between retry attempts. The action pipeline retries a
/// failed turn exactly once (§4.M), so `max_attempts` is expected to be 1 in
/// production, but the helper stays general so tests can exercise more.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_ms: u64,
}

impl RetryConfig {
    /// One retry with a short backoff, matching §4.M's failure semantics.
    pub fn turn_default() -> Self {
        RetryConfig {
            max_attempts: 1,
            initial_backoff_ms: 200,
            backoff_multiplier: 2.0,
            max_backoff_ms: 2_000,
        }
    }

    pub fn disabled() -> Self {
        RetryConfig {
            max_attempts: 0,
            initial_backoff_ms: 0,
            backoff_multiplier: 1.0,
            max_backoff_ms: 0,
        }
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        let base = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis(base.min(self.max_backoff_ms as f64) as u64)
    }
}

/// Runs `op` up to `config.max_attempts + 1` times, sleeping with exponential
/// backoff between attempts. Returns the last error if every attempt fails.
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, mut op: F) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, LlmError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < config.max_attempts => {
                let backoff = config.backoff_for(attempt);
                warn!(attempt, ?backoff, error = %err, "llm call failed, retrying");
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_without_retry_when_first_attempt_ok() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&RetryConfig::turn_default(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, LlmError>(42)
        })
        .await
        .unwrap();
        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_exactly_once_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&RetryConfig::turn_default(), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(LlmError::Timeout)
            } else {
                Ok(7)
            }
        })
        .await
        .unwrap();
        assert_eq!(result, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_exhausting_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<i32, LlmError> = with_retry(&RetryConfig::turn_default(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::Timeout)
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn disabled_config_never_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<i32, LlmError> = with_retry(&RetryConfig::disabled(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::Unavailable("down".into()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
