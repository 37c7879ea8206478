//! Per-attempt deadlines.
//!
//! A deadline that expires counts as a transient network failure, so the
//! retry policy treats it like a dropped connection.

use gateway_core::{GatewayError, GatewayResult};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Default deadline for a chat completion attempt
pub const DEFAULT_CHAT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default deadline for an image generation attempt
pub const DEFAULT_IMAGE_TIMEOUT: Duration = Duration::from_secs(300);

/// Run one attempt under a deadline
///
/// # Errors
/// Returns a retryable transient error when the deadline expires, otherwise
/// the attempt's own error
pub async fn with_deadline<Fut, T>(provider: &str, deadline: Duration, attempt: Fut) -> GatewayResult<T>
where
    Fut: Future<Output = GatewayResult<T>>,
{
    match tokio::time::timeout(deadline, attempt).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                provider = %provider,
                timeout_ms = deadline.as_millis() as u64,
                "Attempt deadline expired"
            );
            Err(GatewayError::transient(
                provider,
                format!("request timed out after {}ms", deadline.as_millis()),
                None,
            ))
        }
    }
}
