use std::future::Future;
use std::time::Duration;

use crate::{StoreError, StoreResult};

/// Runs a store call under `deadline`, failing with `StoreError::Timeout`
/// instead of waiting past it. The call is dropped, and so cancelled, on expiry.
pub async fn with_deadline<F, T>(
    operation: &'static str,
    deadline: Duration,
    future: F,
) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(deadline, future).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, ?deadline, "store call timed out");
            Err(StoreError::Timeout {
                operation,
                deadline,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let result: StoreResult<()> =
            with_deadline("test::slow", Duration::from_secs(1), async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        assert!(matches!(
            result,
            Err(StoreError::Timeout {
                operation: "test::slow",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_fast_call_passes_result_through() {
        let result = with_deadline("test::fast", Duration::from_secs(1), async {
            Err::<(), _>(StoreError::not_found("pod", "ns/missing"))
        })
        .await;

        assert!(result.unwrap_err().is_not_found());
    }
}
