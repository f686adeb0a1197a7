use std::time::Duration;

use reqwest::header::HeaderMap;

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
  /// 401 / 403 with the configured token.
  #[error(
    "platform rejected the configured credentials | {message}"
  )]
  Auth { message: String },

  /// 404
  #[error("platform entity not found | {message}")]
  NotFound { message: String },

  /// 409
  #[error("platform conflict | {message}")]
  Conflict { message: String },

  /// 429. `retry_after` parsed from the Retry-After header when
  /// present.
  #[error("platform throttled the request")]
  RateLimited { retry_after: Option<Duration> },

  /// Network / tls / timeout.
  #[error("failed to reach the platform | {message}")]
  Transport { message: String },

  /// Response body did not parse.
  #[error("platform protocol error | {message}")]
  Protocol { message: String },

  /// Any other non success status (5xx and unexpected 4xx).
  #[error("platform error | status {status} | {message}")]
  Upstream { status: u16, message: String },
}

impl PlatformError {
  /// Only transient kinds may be retried, and only around
  /// idempotent calls.
  pub fn is_transient(&self) -> bool {
    matches!(
      self,
      PlatformError::Transport { .. }
        | PlatformError::RateLimited { .. }
    )
  }

  pub fn retry_after(&self) -> Option<Duration> {
    match self {
      PlatformError::RateLimited { retry_after } => *retry_after,
      _ => None,
    }
  }
}

pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
  headers
    .get("retry-after")?
    .to_str()
    .ok()?
    .parse::<u64>()
    .ok()
    .map(Duration::from_secs)
}
