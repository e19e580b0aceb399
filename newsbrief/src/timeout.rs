//! Deadline guard for a single pending operation.

use std::future::Future;
use std::time::Duration;

/// The deadline elapsed before the guarded operation settled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TimeoutElapsed {
    pub message: String,
    pub deadline: Duration,
}

/// Race `operation` against a timer of length `deadline`.
///
/// Resolves exactly once: with the operation's output if it settles first, otherwise with
/// [`TimeoutElapsed`] carrying `message`. A late operation is dropped, which aborts it at its
/// next await point; whatever it would have produced is discarded.
pub async fn with_timeout<F, T>(
    operation: F,
    deadline: Duration,
    message: impl Into<String>,
) -> Result<T, TimeoutElapsed>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(deadline, operation)
        .await
        .map_err(|_| TimeoutElapsed {
            message: message.into(),
            deadline,
        })
}

/// Millisecond form of [`with_timeout`].
pub async fn with_timeout_ms<F, T>(
    operation: F,
    deadline_ms: u64,
    message: impl Into<String>,
) -> Result<T, TimeoutElapsed>
where
    F: Future<Output = T>,
{
    with_timeout(operation, Duration::from_millis(deadline_ms), message).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn fast_operation_wins() {
        let out = with_timeout(async { 7 }, Duration::from_secs(1), "late").await;
        assert_eq!(out, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_operation_times_out_at_deadline() {
        let start = Instant::now();
        let out = with_timeout_ms(std::future::pending::<()>(), 60_000, "API_TIMEOUT").await;
        let err = out.unwrap_err();

        assert_eq!(err.message, "API_TIMEOUT");
        assert_eq!(err.to_string(), "API_TIMEOUT");
        assert_eq!(err.deadline, Duration::from_millis(60_000));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(60));
        assert!(elapsed < Duration::from_secs(61));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_operation_result_is_discarded() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "done"
        };
        let out = with_timeout(slow, Duration::from_secs(2), "too slow").await;
        assert_eq!(out.unwrap_err().message, "too slow");
    }
}
