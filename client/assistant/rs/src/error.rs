#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
  /// Downstream 401 / 403.
  #[error("assistant rejected the request | {message}")]
  Auth { message: String },

  /// Downstream 404.
  #[error("assistant entity not found | {message}")]
  NotFound { message: String },

  /// Downstream 400 / 422, surfaced to the caller as their own
  /// input error.
  #[error("assistant rejected the input | {message}")]
  Invalid { message: String },

  /// Network / tls / timeout.
  #[error("failed to reach the assistant | {message}")]
  Transport { message: String },

  /// Response body did not parse.
  #[error("assistant protocol error | {message}")]
  Protocol { message: String },

  /// Downstream 5xx or any other unexpected status.
  #[error("assistant error | status {status} | {message}")]
  Upstream { status: u16, message: String },
}
