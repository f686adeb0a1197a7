//! Maps gateway error kinds onto the http error surface.
//!
//! Every user-visible failure carries a stable machine readable
//! `[code]` token at the head of its message, the http status
//! that fits the kind, and the cause chain in the serror trace.
//! Secret material never enters a message.

use anyhow::anyhow;
use assistant_client::AssistantError;
use forge_client::ForgeError;
use platform_client::PlatformError;
use reqwest::StatusCode;
use serror::AddStatusCodeError;

pub fn validation_error(
  message: impl std::fmt::Display,
) -> serror::Error {
  anyhow!("[validation_error] {message}")
    .status_code(StatusCode::BAD_REQUEST)
}

pub fn not_found(message: impl std::fmt::Display) -> serror::Error {
  anyhow!("[not_found] {message}")
    .status_code(StatusCode::NOT_FOUND)
}

pub fn conflict(message: impl std::fmt::Display) -> serror::Error {
  anyhow!("[conflict] {message}")
    .status_code(StatusCode::CONFLICT)
}

pub fn config_error(
  message: impl std::fmt::Display,
) -> serror::Error {
  anyhow!("[config_error] {message}")
    .status_code(StatusCode::INTERNAL_SERVER_ERROR)
}

pub fn service_unavailable(
  message: impl std::fmt::Display,
) -> serror::Error {
  anyhow!("[service_unavailable] {message}")
    .status_code(StatusCode::SERVICE_UNAVAILABLE)
}

pub fn internal_error(
  message: impl std::fmt::Display,
) -> serror::Error {
  anyhow!("[internal_error] {message}")
    .status_code(StatusCode::INTERNAL_SERVER_ERROR)
}

pub fn forge_error(e: ForgeError) -> serror::Error {
  let (status, code) = taxonomize_forge(&e);
  anyhow::Error::new(e)
    .context(format!("[{code}] forge call failed"))
    .status_code(status)
}

fn taxonomize_forge(e: &ForgeError) -> (StatusCode, String) {
  match e {
    ForgeError::Auth { .. } => {
      (StatusCode::BAD_GATEWAY, String::from("auth_error"))
    }
    ForgeError::NotFound { .. } => {
      (StatusCode::NOT_FOUND, String::from("not_found"))
    }
    ForgeError::Conflict { .. } => {
      (StatusCode::CONFLICT, String::from("conflict"))
    }
    ForgeError::RateLimited { retry_after } => (
      StatusCode::TOO_MANY_REQUESTS,
      match retry_after {
        Some(after) => format!(
          "rate_limited:retry_after_ms={}",
          after.as_millis()
        ),
        None => String::from("rate_limited"),
      },
    ),
    ForgeError::Transport { .. } => {
      (StatusCode::BAD_GATEWAY, String::from("transport_error"))
    }
    ForgeError::Protocol { .. }
    | ForgeError::Upstream { .. } => (
      StatusCode::BAD_GATEWAY,
      String::from("upstream_error:forge"),
    ),
  }
}

pub fn platform_error(e: PlatformError) -> serror::Error {
  let (status, code) = taxonomize_platform(&e);
  anyhow::Error::new(e)
    .context(format!("[{code}] platform call failed"))
    .status_code(status)
}

fn taxonomize_platform(
  e: &PlatformError,
) -> (StatusCode, String) {
  match e {
    PlatformError::Auth { .. } => {
      (StatusCode::BAD_GATEWAY, String::from("auth_error"))
    }
    PlatformError::NotFound { .. } => {
      (StatusCode::NOT_FOUND, String::from("not_found"))
    }
    PlatformError::Conflict { .. } => {
      (StatusCode::CONFLICT, String::from("conflict"))
    }
    PlatformError::RateLimited { retry_after } => (
      StatusCode::TOO_MANY_REQUESTS,
      match retry_after {
        Some(after) => format!(
          "rate_limited:retry_after_ms={}",
          after.as_millis()
        ),
        None => String::from("rate_limited"),
      },
    ),
    PlatformError::Transport { .. } => {
      (StatusCode::BAD_GATEWAY, String::from("transport_error"))
    }
    PlatformError::Protocol { .. }
    | PlatformError::Upstream { .. } => (
      StatusCode::BAD_GATEWAY,
      String::from("upstream_error:platform"),
    ),
  }
}

pub fn assistant_error(e: AssistantError) -> serror::Error {
  let (status, code) = match &e {
    AssistantError::Auth { .. } => {
      (StatusCode::BAD_GATEWAY, "auth_error")
    }
    AssistantError::NotFound { .. } => {
      (StatusCode::NOT_FOUND, "not_found")
    }
    AssistantError::Invalid { .. } => {
      (StatusCode::BAD_REQUEST, "validation_error")
    }
    AssistantError::Transport { .. } => {
      (StatusCode::BAD_GATEWAY, "transport_error")
    }
    AssistantError::Protocol { .. }
    | AssistantError::Upstream { .. } => {
      (StatusCode::BAD_GATEWAY, "upstream_error:assistant")
    }
  };
  anyhow::Error::new(e)
    .context(format!("[{code}] assistant call failed"))
    .status_code(status)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn forge_conflict_maps_to_409_with_code() {
    let err = forge_error(ForgeError::Conflict {
      message: String::from("repo exists"),
    });
    assert_eq!(err.status, StatusCode::CONFLICT);
    assert!(format!("{:#}", err.error).contains("[conflict]"));
  }

  #[test]
  fn platform_transport_maps_to_502() {
    let err = platform_error(PlatformError::Transport {
      message: String::from("connection refused"),
    });
    assert_eq!(err.status, StatusCode::BAD_GATEWAY);
    assert!(
      format!("{:#}", err.error).contains("[transport_error]")
    );
  }

  #[test]
  fn rate_limit_carries_retry_after() {
    let err = platform_error(PlatformError::RateLimited {
      retry_after: Some(std::time::Duration::from_secs(7)),
    });
    assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(
      format!("{:#}", err.error)
        .contains("retry_after_ms=7000")
    );
  }

  #[test]
  fn service_unavailable_is_503() {
    let err = service_unavailable("project not running");
    assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
  }
}
