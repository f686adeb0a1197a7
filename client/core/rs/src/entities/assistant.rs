use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::JsonValue;

/// One item of the assistant's server-sent event stream,
/// forwarded verbatim by the event bridge.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantEvent {
  #[serde(rename = "type")]
  pub kind: String,
  #[serde(default)]
  pub properties: JsonValue,
}

/// One part of an assistant chat message.
#[typeshare]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePart {
  /// Part discriminator, eg `text` / `file`.
  #[serde(rename = "type")]
  pub kind: String,
  #[serde(default)]
  pub text: String,
}

impl MessagePart {
  pub fn text(text: impl Into<String>) -> MessagePart {
    MessagePart {
      kind: String::from("text"),
      text: text.into(),
    }
  }
}
