//! Bounded retry for notification delivery.
//!
//! Transient failures (connect errors, timeouts, 5xx, Telegram flood control)
//! are retried with exponential back-off and jitter. Rejections such as an
//! unknown chat id are returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::NotifierError;

/// Upper bound for a single back-off sleep.
const MAX_DELAY_MS: u64 = 30_000;

pub(crate) fn is_retriable(err: &NotifierError) -> bool {
    match err {
        NotifierError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        NotifierError::RateLimited { .. } => true,
        NotifierError::UnexpectedStatus { status, .. } => *status >= 500,
        NotifierError::Api { .. } | NotifierError::InvalidUrl(_) => false,
    }
}

/// Delay before retry number `attempt` (1-based).
///
/// `backoff_base_ms × 2^(attempt-1)` scaled by a random factor in
/// `[0.75, 1.25)`, capped at 30 s. A rate-limit answer raises the floor to the
/// server's `retry_after`.
pub(crate) fn backoff_delay(attempt: u32, backoff_base_ms: u64, err: &NotifierError) -> Duration {
    let computed = backoff_base_ms.saturating_mul(1_u64 << attempt.saturating_sub(1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;

    let floor = match err {
        NotifierError::RateLimited {
            retry_after_secs, ..
        } => retry_after_secs.saturating_mul(1_000).min(MAX_DELAY_MS),
        _ => 0,
    };
    Duration::from_millis(jittered.max(floor))
}

pub(crate) async fn retry_with_backoff<T, F, Fut>(
    operation_name: &str,
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, NotifierError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, NotifierError>>,
{
    let mut attempt = 0_u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay = backoff_delay(attempt, backoff_base_ms, &err);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "notification delivery failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
