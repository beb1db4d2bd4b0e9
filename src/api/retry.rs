// ABOUTME: Bounded exponential-backoff retry for provisioning calls.
// ABOUTME: Retries 404/no-response only; cancellation aborts immediately.

use super::error::ApiError;
use crate::cancel::CancelToken;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

/// Run `operation` under the provisioning retry policy.
///
/// Retries only errors where [`ApiError::is_provisioning_retryable`] holds:
/// a 404 response (the resource has not materialized yet) or a transport
/// error with no response. Any other error class surfaces immediately. Once
/// attempts are exhausted the last error surfaces verbatim. Cancellation
/// wins over both the in-flight call and the backoff sleep.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &mut CancelToken,
    mut operation: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut backoff = policy.initial_backoff;
    let mut attempt = 1u32;

    loop {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            result = operation() => result,
        };

        match result {
            Ok(value) => return Ok(value),
            Err(error) if attempt < policy.max_attempts && error.is_provisioning_retryable() => {
                debug!(attempt, "retrying in {backoff:?}: {error}");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                    _ = tokio::time::sleep(backoff) => {}
                }
                backoff = (backoff * 2).min(policy.max_backoff);
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}
