use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::PipelineError;

/// Upper bound on a single back-off sleep
const MAX_DELAY_MS: u64 = 30_000;

/// Run `operation` up to `max_attempts` times, backing off between transient failures
///
/// The delay before attempt `n + 1` is `backoff_base_ms * 2^(n - 1)`, capped at
/// 30 s. Errors other than [`PipelineError::TransientService`] are returned
/// immediately. The last transient error is returned once attempts run out.
pub async fn retry_with_backoff<T, F, Fut>(
    max_attempts: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, PipelineError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, PipelineError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1u32;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_transient() || attempt >= max_attempts {
                    return Err(err);
                }
                let delay_ms = backoff_delay_ms(backoff_base_ms, attempt);
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms,
                    error = %err,
                    "transient classifier error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
        }
    }
}

fn backoff_delay_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms
        .saturating_mul(1u64 << (attempt.saturating_sub(1)).min(16))
        .min(MAX_DELAY_MS)
}
