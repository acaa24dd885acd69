//! `RetryBoundedWithDelay`: a generic combinator over a fallible async
//! operation, used by both the producer and the consumer. Not specific to
//! PUT or GET — it just runs `operation` until it succeeds or `max_retries`
//! attempts have been made, sleeping `delay` between attempts and invoking
//! `on_retry` (which ticks the caller's Lamport clock) before each retry.
//!
//! Grounded on the teacher's `HttpEventSink::send_event` retry loop, which
//! interleaves attempt counting, a delay, and structured logging around a
//! fallible `reqwest` call — generalized here into a reusable combinator
//! instead of being written out per call site.

use crate::errors::FabricResult;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

pub const MAX_RETRIES: u32 = 3;
pub const RETRY_DELAY_MS: u64 = 5_000;

/// Run `operation` up to `max_retries` times. `on_retry` fires after each
/// failed attempt that is not the last, before the delay.
pub async fn retry_bounded_with_delay<T, F, Fut>(
    max_retries: u32,
    delay: Duration,
    mut on_retry: impl FnMut(),
    mut operation: F,
) -> FabricResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = FabricResult<T>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= max_retries => return Err(err),
            Err(err) => {
                warn!(attempt, max_retries, error = %err, "attempt failed, retrying");
                on_retry();
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FabricError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_immediately_without_retry() {
        let attempts = AtomicU32::new(0);
        let retries = AtomicU32::new(0);
        let result = retry_bounded_with_delay(
            3,
            Duration::from_millis(0),
            || {
                retries.fetch_add(1, Ordering::SeqCst);
            },
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, FabricError>(42) }
            },
        )
        .await
        .unwrap();
        assert_eq!(result, 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(retries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn retries_until_success_within_bound() {
        let attempts = AtomicU32::new(0);
        let result = retry_bounded_with_delay(
            3,
            Duration::from_millis(0),
            || {},
            || {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(FabricError::transport("not yet"))
                    } else {
                        Ok(n)
                    }
                }
            },
        )
        .await
        .unwrap();
        assert_eq!(result, 3);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let attempts = AtomicU32::new(0);
        let retry_ticks = AtomicU32::new(0);
        let result = retry_bounded_with_delay(
            3,
            Duration::from_millis(0),
            || {
                retry_ticks.fetch_add(1, Ordering::SeqCst);
            },
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<u32, _>(FabricError::transport("always fails")) }
            },
        )
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(retry_ticks.load(Ordering::SeqCst), 2);
    }
}
