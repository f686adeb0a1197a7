//! Typed surface over the per-project OpenCode assistant api.
//! One client per project container, prepared with the resolved
//! base url and kept in the proxy's client cache.
//!
//! Never retries. Downstream failures are reported with their
//! taxonomic kind and the caller decides.

use std::{pin::Pin, time::Duration};

use bytes::Bytes;
use codeopen_client::entities::{
  JsonValue, assistant::MessagePart,
};
use futures::Stream;
use serde_json::json;

mod error;
mod sse;

pub use error::AssistantError;
pub use sse::{EventStream, SseDecoder, event_stream};

/// Raw downstream byte stream feeding the sse decoder.
pub type EventSource = Pin<
  Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>,
>;

#[derive(Clone)]
pub struct AssistantClient {
  base_url: String,
  reqwest: reqwest::Client,
}

impl AssistantClient {
  /// `base_url` is the project's resolved FQDN url,
  /// eg `https://opencode-hello-world.apps.example.com`.
  pub fn new(
    base_url: impl Into<String>,
    timeout: Duration,
  ) -> AssistantClient {
    AssistantClient {
      base_url: base_url
        .into()
        .trim_end_matches('/')
        .to_string(),
      reqwest: reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("failed to build assistant http client"),
    }
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  /// Url of the downstream event stream, for callers connecting
  /// directly instead of through the proxy bridge.
  pub fn event_stream_url(&self) -> String {
    format!("{}/event", self.base_url)
  }

  pub async fn list_sessions(
    &self,
  ) -> Result<JsonValue, AssistantError> {
    let req =
      self.reqwest.get(format!("{}/session", self.base_url));
    self.resolve(req).await
  }

  pub async fn create_session(
    &self,
    title: &str,
  ) -> Result<JsonValue, AssistantError> {
    let mut body = json!({});
    if !title.is_empty() {
      body = json!({ "title": title });
    }
    let req = self
      .reqwest
      .post(format!("{}/session", self.base_url))
      .json(&body);
    self.resolve(req).await
  }

  pub async fn list_messages(
    &self,
    session_id: &str,
  ) -> Result<JsonValue, AssistantError> {
    let req = self.reqwest.get(format!(
      "{}/session/{session_id}/message",
      self.base_url
    ));
    self.resolve(req).await
  }

  pub async fn send_message(
    &self,
    session_id: &str,
    parts: &[MessagePart],
  ) -> Result<JsonValue, AssistantError> {
    let req = self
      .reqwest
      .post(format!(
        "{}/session/{session_id}/message",
        self.base_url
      ))
      .json(&json!({ "parts": parts }));
    self.resolve(req).await
  }

  pub async fn read_file(
    &self,
    path: &str,
  ) -> Result<JsonValue, AssistantError> {
    let req = self
      .reqwest
      .get(format!("{}/file", self.base_url))
      .query(&[("path", path)]);
    self.resolve(req).await
  }

  pub async fn find_in_files(
    &self,
    pattern: &str,
  ) -> Result<JsonValue, AssistantError> {
    let req = self
      .reqwest
      .get(format!("{}/find", self.base_url))
      .query(&[("pattern", pattern)]);
    self.resolve(req).await
  }

  pub async fn get_app_info(
    &self,
  ) -> Result<JsonValue, AssistantError> {
    let req = self.reqwest.get(format!("{}/app", self.base_url));
    self.resolve(req).await
  }

  /// Opens the downstream server-sent-event stream. The returned
  /// stream is lazy and finite iff the downstream terminates or
  /// the caller drops it.
  pub async fn subscribe_events(
    &self,
  ) -> Result<EventStream<EventSource>, AssistantError> {
    let res = self
      .reqwest
      .get(format!("{}/event", self.base_url))
      .header("Accept", "text/event-stream")
      // The stream outlives any sane request timeout.
      .timeout(Duration::from_secs(60 * 60 * 24))
      .send()
      .await
      .map_err(|e| AssistantError::Transport {
        message: format!("{e:?}"),
      })?;
    let res = Self::check_status(res).await?;
    let source: EventSource = Box::pin(res.bytes_stream());
    Ok(event_stream(source))
  }

  async fn resolve(
    &self,
    req: reqwest::RequestBuilder,
  ) -> Result<JsonValue, AssistantError> {
    let res = req.send().await.map_err(|e| {
      AssistantError::Transport {
        message: format!("{e:?}"),
      }
    })?;
    let res = Self::check_status(res).await?;
    let text = res.text().await.map_err(|e| {
      AssistantError::Protocol {
        message: format!("failed to read response body | {e}"),
      }
    })?;
    serde_json::from_str(&text).map_err(|e| {
      AssistantError::Protocol {
        message: format!(
          "failed to parse response body | {e} | body: {text}"
        ),
      }
    })
  }

  async fn check_status(
    res: reqwest::Response,
  ) -> Result<reqwest::Response, AssistantError> {
    let status = res.status();
    if status.is_success() {
      return Ok(res);
    }
    let message = res.text().await.unwrap_or_default();
    Err(match status.as_u16() {
      400 | 422 => AssistantError::Invalid { message },
      401 | 403 => AssistantError::Auth { message },
      404 => AssistantError::NotFound { message },
      _ => AssistantError::Upstream {
        status: status.as_u16(),
        message,
      },
    })
  }
}
