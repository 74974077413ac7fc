use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use super::{CompletionClient, CompletionParams};
use crate::errors::CompletionError;
use crate::prompt::PromptText;

/// Bounded exponential backoff for transient completion failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 4, initial_backoff_ms: 2_000, max_backoff_ms: 60_000 }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u64.checked_shl(retry.saturating_sub(1)).unwrap_or(u64::MAX);
        let ms = self.initial_backoff_ms.saturating_mul(factor).min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    /// `None` when the server asks for a longer wait than `max_backoff_ms` allows.
    fn delay_for(&self, err: &CompletionError, retry: u32) -> Option<Duration> {
        let computed = self.backoff(retry);
        match err {
            CompletionError::RateLimited { retry_after: Some(wait) } => {
                (*wait <= Duration::from_millis(self.max_backoff_ms)).then(|| computed.max(*wait))
            }
            _ => Some(computed),
        }
    }
}

/// Call `client`, retrying rate limits and service errors per `policy`.
/// The last error is returned once attempts run out.
pub async fn complete_with_retry(
    client: &dyn CompletionClient,
    prompt: &PromptText,
    params: &CompletionParams,
    policy: &RetryPolicy,
) -> Result<String, CompletionError> {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match client.complete(prompt, params).await {
            Ok(text) => return Ok(text),
            Err(err) if err.is_retryable() && attempt < attempts => {
                let Some(delay) = policy.delay_for(&err, attempt) else {
                    warn!(attempt, error = %err, "server retry-after exceeds max backoff; giving up");
                    return Err(err);
                };
                warn!(attempt, max_attempts = attempts, delay_ms = delay.as_millis() as u64, error = %err, "retrying completion");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
