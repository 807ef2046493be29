use std::future::Future;
use std::time::Duration;

use super::ClientError;

/// Extra wait added on top of the server-signaled delay, so a retry never
/// lands just inside the limiter's window.
const RATE_LIMIT_DEADZONE: Duration = Duration::from_millis(50);

/// Retry `op` for as long as it reports [`ClientError::RateLimited`],
/// sleeping the signaled delay plus a small dead zone between attempts.
///
/// The delivery queue itself never retries failed sends; client
/// implementations wrap their homeserver calls with this helper so rate
/// limiting stays invisible to the queue.
pub async fn retry_rate_limited<T, F, Fut>(mut op: F) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    loop {
        match op().await {
            Err(ClientError::RateLimited { retry_after_ms }) => {
                let delay = Duration::from_millis(retry_after_ms) + RATE_LIMIT_DEADZONE;
                tracing::debug!(
                    retry_after_ms = retry_after_ms,
                    delay_ms = delay.as_millis() as u64,
                    "Rate limited, waiting before retry"
                );
                tokio::time::sleep(delay).await;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let attempts = AtomicUsize::new(0);

        let result = retry_rate_limited(|| {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ClientError::RateLimited { retry_after_ms: 200 })
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_pass_through() {
        let attempts = AtomicUsize::new(0);

        let result: Result<(), _> = retry_rate_limited(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async {
                Err(ClientError::Rejected {
                    code: "M_FORBIDDEN".to_string(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(ClientError::Rejected { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleeps_signaled_delay() {
        let start = tokio::time::Instant::now();
        let attempts = AtomicUsize::new(0);

        let _ = retry_rate_limited(|| {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(ClientError::RateLimited { retry_after_ms: 1000 })
                } else {
                    Ok(())
                }
            }
        })
        .await;

        // Signaled delay plus the fixed dead zone
        assert!(start.elapsed() >= Duration::from_millis(1050));
    }
}
