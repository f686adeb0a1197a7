use axum::response::IntoResponse;

/// Response serialization deferred to the http handler,
/// used as the enum level response of resolver apis.
pub enum JsonString {
  Ok(String),
  Err(serde_json::Error),
}

impl<T: serde::Serialize> From<T> for JsonString {
  fn from(value: T) -> JsonString {
    match serde_json::to_string(&value) {
      Ok(res) => JsonString::Ok(res),
      Err(e) => JsonString::Err(e),
    }
  }
}

/// Pre-built axum response, used as the enum level response of
/// resolver apis whose handlers return the response directly.
pub struct Response(pub axum::response::Response);

impl<T: serde::Serialize> From<T> for Response {
  fn from(value: T) -> Response {
    match serde_json::to_string(&value) {
      Ok(res) => Response(
        (
          [(
            axum::http::header::CONTENT_TYPE,
            "application/json",
          )],
          res,
        )
          .into_response(),
      ),
      Err(e) => Response(
        (
          axum::http::StatusCode::INTERNAL_SERVER_ERROR,
          format!("failed to serialize response: {e:?}"),
        )
          .into_response(),
      ),
    }
  }
}
