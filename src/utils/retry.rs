//! Bounded retry for transient upstream failures

use std::future::Future;
use std::time::Duration;

/// Runs `operation` up to `max_attempts` times with a fixed `delay` between
/// attempts. Returns the first success, or the last error once the attempts
/// are exhausted. A `max_attempts` of zero is treated as one attempt.
pub async fn with_retry<T, E, F, Fut>(
    mut operation: F,
    max_attempts: u32,
    delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(_) if attempt < max_attempts => {
                tracing::debug!(attempt, max_attempts, "operation failed, retrying");
                attempt += 1;
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            Err(error) => return Err(error),
        }
    }
}
