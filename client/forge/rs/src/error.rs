use std::time::Duration;

use reqwest::header::HeaderMap;

#[derive(Debug, thiserror::Error)]
pub enum ForgeError {
  /// 401 / 403 with the configured token.
  #[error("forge rejected the configured credentials | {message}")]
  Auth { message: String },

  /// 404
  #[error("forge entity not found | {message}")]
  NotFound { message: String },

  /// 409, eg repo name collision.
  #[error("forge name conflict | {message}")]
  Conflict { message: String },

  /// 429. `retry_after` parsed from the Retry-After header when
  /// present.
  #[error("forge throttled the request")]
  RateLimited { retry_after: Option<Duration> },

  /// Network / tls / timeout.
  #[error("failed to reach the forge | {message}")]
  Transport { message: String },

  /// Response body did not parse.
  #[error("forge protocol error | {message}")]
  Protocol { message: String },

  /// Any other non success status (5xx and unexpected 4xx).
  #[error("forge error | status {status} | {message}")]
  Upstream { status: u16, message: String },
}

impl ForgeError {
  /// Only transient kinds may be retried, and only around
  /// idempotent calls.
  pub fn is_transient(&self) -> bool {
    matches!(
      self,
      ForgeError::Transport { .. }
        | ForgeError::RateLimited { .. }
    )
  }

  pub fn retry_after(&self) -> Option<Duration> {
    match self {
      ForgeError::RateLimited { retry_after } => *retry_after,
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
