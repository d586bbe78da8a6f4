use crate::config::Config;
use crate::models::error::AppError;
use gloo_timers::future::TimeoutFuture;
use std::future::Future;

/// Runs an async operation, retrying failed attempts with exponential backoff.
///
/// # Arguments
///
/// * `operation` - A closure that returns a Future resolving to `Result<T, AppError>`
/// * `retries` - Extra attempts after the first failure (`0` means a single attempt)
/// * `base_delay_ms` - Delay before the first retry; `0` retries immediately
///
/// # Behavior
///
/// - Delay doubles per attempt (1s → 2s → 4s ...), capped at 30s
/// - `NotFound`, `Unauthorized` and validation failures are returned immediately
/// - Otherwise the last error is returned once attempts run out
pub async fn retry_with_backoff<F, Fut, T>(
    mut operation: F,
    retries: u32,
    base_delay_ms: u32,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < retries => {
                let delay_ms = backoff_delay(base_delay_ms, attempt);
                tracing::warn!(
                    "request failed ({e}), retrying in {delay_ms}ms (attempt {}/{})",
                    attempt + 1,
                    retries
                );
                if delay_ms > 0 {
                    TimeoutFuture::new(delay_ms).await;
                }
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Delay before retry number `attempt` (zero-based).
pub fn backoff_delay(base_delay_ms: u32, attempt: u32) -> u32 {
    base_delay_ms
        .saturating_mul(2u32.saturating_pow(attempt))
        .min(Config::MAX_RETRY_DELAY_MS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::Cell;

    #[test]
    fn test_backoff_delay() {
        assert_eq!(backoff_delay(1_000, 0), 1_000);
        assert_eq!(backoff_delay(1_000, 1), 2_000);
        assert_eq!(backoff_delay(1_000, 5), 30_000);
        assert_eq!(backoff_delay(1_000, 40), 30_000);
        assert_eq!(backoff_delay(0, 3), 0);
    }

    #[test]
    fn test_retries_then_succeeds() {
        let calls = Cell::new(0);
        let result = block_on(retry_with_backoff(
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 2 {
                        Err(AppError::Network("flaky".into()))
                    } else {
                        Ok(n)
                    }
                }
            },
            1,
            0,
        ));

        assert_eq!(result, Ok(2));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_gives_up_after_retries() {
        let calls = Cell::new(0);
        let result: Result<(), _> = block_on(retry_with_backoff(
            || {
                calls.set(calls.get() + 1);
                async { Err(AppError::Api { status: 503, message: "down".into() }) }
            },
            2,
            0,
        ));

        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_not_found_short_circuits() {
        let calls = Cell::new(0);
        let result: Result<(), _> = block_on(retry_with_backoff(
            || {
                calls.set(calls.get() + 1);
                async { Err(AppError::NotFound("missing".into())) }
            },
            3,
            0,
        ));

        assert_eq!(result, Err(AppError::NotFound("missing".into())));
        assert_eq!(calls.get(), 1);
    }
}
