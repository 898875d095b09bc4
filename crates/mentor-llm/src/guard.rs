//! Cancellation and deadline enforcement for gateway calls.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::{LLMError, Result};

/// Runs `future` until it finishes, the token is cancelled, or `timeout` elapses.
pub async fn guarded<T, F>(
    operation: &str,
    cancel: &CancellationToken,
    timeout: Duration,
    future: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(LLMError::Cancelled);
    }

    let started = Instant::now();
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(LLMError::Cancelled),
        result = tokio::time::timeout(timeout, future) => match result {
            Ok(result) => result,
            Err(_) => Err(LLMError::Timeout {
                operation: operation.to_string(),
                secs: timeout.as_secs(),
            }),
        },
    };

    log::debug!(
        "[gateway] {} finished in {:?} ({})",
        operation,
        started.elapsed(),
        if outcome.is_ok() { "ok" } else { "error" }
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_result_when_future_completes() {
        let token = CancellationToken::new();
        let value = guarded("op", &token, Duration::from_secs(1), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        let result: Result<()> =
            guarded("op", &token, Duration::from_secs(1), std::future::pending()).await;
        assert!(matches!(result, Err(LLMError::Cancelled)));
    }

    #[tokio::test]
    async fn cancellation_during_wait_aborts() {
        let token = CancellationToken::new();
        let child = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            child.cancel();
        });

        let result: Result<()> =
            guarded("op", &token, Duration::from_secs(30), std::future::pending()).await;
        assert!(matches!(result, Err(LLMError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_surfaces_as_timeout() {
        let token = CancellationToken::new();
        let result: Result<()> =
            guarded("task_plan", &token, Duration::from_secs(5), std::future::pending()).await;
        assert!(matches!(
            result,
            Err(LLMError::Timeout { ref operation, secs: 5 }) if operation == "task_plan"
        ));
    }
}
