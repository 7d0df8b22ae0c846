use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;

use crate::error::LlmError;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
const BASE_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Bounded exponential backoff for generation calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_backoff: BASE_BACKOFF,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32, base_backoff: Duration) -> Self {
        Self {
            max_retries,
            base_backoff,
        }
    }

    /// Delay before retry number `attempt + 1`: `base * 2^attempt`, capped.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

pub(crate) fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Parse the `Retry-After` header value as seconds, falling back to exponential backoff.
pub(crate) fn retry_delay(response: &reqwest::Response, policy: &RetryPolicy, attempt: u32) -> Duration {
    if let Some(val) = response.headers().get("retry-after")
        && let Ok(s) = val.to_str()
        && let Ok(secs) = s.parse::<u64>()
    {
        return Duration::from_secs(secs).min(MAX_BACKOFF);
    }
    policy.backoff(attempt)
}

/// Send an HTTP request, retrying on rate limits, 5xx gateway errors, timeouts and
/// connection failures.
///
/// Returns the first non-transient `Response` for the caller to inspect.
///
/// # Errors
///
/// Returns `LlmError::RateLimited` or `LlmError::Transient` once all attempts are spent
/// on transient statuses, and `LlmError::Http` for transport errors.
pub(crate) async fn send_with_retry<F, Fut>(
    provider_name: &'static str,
    policy: RetryPolicy,
    mut f: F,
) -> Result<reqwest::Response, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut attempt = 0;
    loop {
        let delay = match f().await {
            Ok(response) => {
                let status = response.status();
                if !is_transient_status(status) {
                    return Ok(response);
                }
                if attempt >= policy.max_retries {
                    return Err(if status == StatusCode::TOO_MANY_REQUESTS {
                        LlmError::RateLimited
                    } else {
                        LlmError::Transient {
                            provider: provider_name,
                            status: status.as_u16(),
                        }
                    });
                }
                retry_delay(&response, &policy, attempt)
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                if attempt >= policy.max_retries {
                    return Err(LlmError::Http(e));
                }
                policy.backoff(attempt)
            }
            Err(e) => return Err(LlmError::Http(e)),
        };

        tracing::warn!(
            provider = provider_name,
            attempt = attempt + 1,
            max_retries = policy.max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "transient generation failure, retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
