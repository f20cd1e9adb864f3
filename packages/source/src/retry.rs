//! HTTP retry helper for transient errors.
//!
//! Every upstream request goes through [`send_json`] rather than calling
//! `reqwest::RequestBuilder::send()` directly, so connection failures,
//! timeouts, rate limiting, and server errors are retried with exponential
//! backoff.
//!
//! ```ignore
//! let page = retry::send_json(|| client.get(&url).query(&params), &RetryPolicy::default()).await?;
//! ```

use std::time::Duration;

use crate::SourceError;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 500;

/// Backoff settings for [`send_json`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one before giving up.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on every subsequent retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    /// Five retries starting at two seconds (2s, 4s, 8s, 16s, 32s).
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// What to do with a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    Accept,
    Retry,
    Fail,
}

/// Classifies a response status: 429 and 5xx are transient, any other 4xx
/// is permanent, everything else is accepted.
#[must_use]
pub fn classify_status(status: reqwest::StatusCode) -> StatusAction {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        StatusAction::Retry
    } else if status.is_client_error() {
        StatusAction::Fail
    } else {
        StatusAction::Accept
    }
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}

/// Sends the request built by `build_request` and parses the body as JSON.
///
/// The closure is called once per attempt since builders are consumed by
/// `.send()`. Transient transport errors, HTTP 429, and HTTP 5xx are
/// retried according to `policy`. Other 4xx responses fail immediately.
/// A body that fails to parse is not retried.
///
/// # Errors
///
/// Returns [`SourceError::Http`] for transport failures,
/// [`SourceError::Status`] for rejected statuses, and
/// [`SourceError::Json`] if the body is not valid JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(
    build_request: F,
    policy: &RetryPolicy,
) -> Result<serde_json::Value, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = policy.delay_for(attempt);
            log::warn!("  retry {attempt}/{} in {delay:?}...", policy.max_retries);
            tokio::time::sleep(delay).await;
        }
        let can_retry = attempt < policy.max_retries;
        attempt += 1;

        let response = match build_request().send().await {
            Ok(response) => response,
            Err(e) if can_retry && is_transient(&e) => {
                log::warn!("  transient error: {e}");
                continue;
            }
            Err(e) => return Err(SourceError::Http(e)),
        };

        let status = response.status();
        let url = response.url().to_string();

        match classify_status(status) {
            StatusAction::Retry if can_retry => {
                log::warn!("  HTTP {status} from {url}");
                continue;
            }
            StatusAction::Retry | StatusAction::Fail => {
                return Err(SourceError::Status {
                    status: status.as_u16(),
                    url,
                });
            }
            StatusAction::Accept => {}
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) if can_retry && is_transient(&e) => {
                log::warn!("  body read failed: {e}");
                continue;
            }
            Err(e) => return Err(SourceError::Http(e)),
        };

        return serde_json::from_str(&text).map_err(|e| {
            let preview: String = text.chars().take(BODY_PREVIEW_LEN).collect();
            log::error!(
                "JSON parse failed.\n  \
                 url: {url}\n  \
                 received: {} bytes\n  \
                 parse error: {e}\n  \
                 body preview: {preview}",
                text.len(),
            );
            SourceError::Json(e)
        });
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn classifies_statuses() {
        assert_eq!(classify_status(StatusCode::OK), StatusAction::Accept);
        assert_eq!(classify_status(StatusCode::NOT_MODIFIED), StatusAction::Accept);
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            StatusAction::Retry
        );
        assert_eq!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE),
            StatusAction::Retry
        );
        assert_eq!(classify_status(StatusCode::NOT_FOUND), StatusAction::Fail);
        assert_eq!(classify_status(StatusCode::FORBIDDEN), StatusAction::Fail);
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(5), Duration::from_secs(32));
    }

    #[test]
    fn backoff_saturates() {
        let policy = RetryPolicy::default();
        assert!(policy.delay_for(200) >= policy.delay_for(5));
    }
}
