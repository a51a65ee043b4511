//! Retry with exponential backoff for transient store errors
//!
//! Used for writes that must land, such as a job's terminal state. Errors
//! that retrying cannot fix (validation, missing job, rejected transition)
//! are returned on the first attempt.

use std::future::Future;
use std::time::{Duration, Instant};

use adn_common::{Error, Result};

const INITIAL_BACKOFF: Duration = Duration::from_millis(10);
const MAX_BACKOFF: Duration = Duration::from_millis(1000);

/// Storage or I/O failures that may succeed on a later attempt
pub fn is_transient(err: &Error) -> bool {
    matches!(err, Error::Database(_) | Error::Io(_) | Error::Internal(_))
}

/// Run `operation` until it succeeds, fails permanently, or `max_wait` elapses
///
/// Backoff starts at 10ms and doubles up to 1s. The last error is returned
/// once the time budget is spent.
pub async fn retry_transient<F, Fut, T>(operation_name: &str, max_wait: Duration, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let mut attempt = 0u32;
    let mut backoff = INITIAL_BACKOFF;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Store operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) if !is_transient(&err) => return Err(err),
            Err(err) => {
                let elapsed = start.elapsed();
                if elapsed >= max_wait {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = elapsed.as_millis() as u64,
                        error = %err,
                        "Store operation failed: retry budget exhausted"
                    );
                    return Err(err);
                }

                let delay = backoff.min(max_wait - elapsed);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms = delay.as_millis() as u64,
                    error = %err,
                    "Store operation failed, will retry after backoff"
                );

                tokio::time::sleep(delay).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);

        let result = retry_transient("test", Duration::from_secs(1), || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call < 2 {
                    Err(Error::Internal("locked".to_string()))
                } else {
                    Ok(call)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = retry_transient("test", Duration::from_secs(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::InvalidTransition("terminal".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(Error::InvalidTransition(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_wait() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = retry_transient("test", Duration::from_millis(50), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::Internal("still locked".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(Error::Internal(_))));
        assert!(calls.load(Ordering::SeqCst) >= 2);
    }
}
