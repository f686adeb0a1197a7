use derive_empty_traits::EmptyTraits;
use resolver_api::{HasResponse, Resolve};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::{JsonValue, assistant::MessagePart};

pub trait CodeopenAssistantRequest: HasResponse {}

/// List chat sessions on the project's assistant.
/// Requires the project to be running.
/// Response: the assistant payload, verbatim.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenAssistantRequest)]
#[response(JsonValue)]
#[error(serror::Error)]
pub struct ListSessions {
  /// Id or slug
  pub project: String,
}

/// Create a chat session on the project's assistant.
/// Response: the assistant payload, verbatim.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenAssistantRequest)]
#[response(JsonValue)]
#[error(serror::Error)]
pub struct CreateSession {
  /// Id or slug
  pub project: String,
  #[serde(default)]
  pub title: String,
}

/// List the messages of an assistant session.
/// Response: the assistant payload, verbatim.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenAssistantRequest)]
#[response(JsonValue)]
#[error(serror::Error)]
pub struct ListMessages {
  /// Id or slug
  pub project: String,
  pub session: String,
}

/// Send a prompt to an assistant session.
/// Response: the assistant payload, verbatim.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenAssistantRequest)]
#[response(JsonValue)]
#[error(serror::Error)]
pub struct SendMessage {
  /// Id or slug
  pub project: String,
  pub session: String,
  pub parts: Vec<MessagePart>,
}

/// Read a file from the project workspace through the assistant.
/// Response: the assistant payload, verbatim.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenAssistantRequest)]
#[response(JsonValue)]
#[error(serror::Error)]
pub struct ReadProjectFile {
  /// Id or slug
  pub project: String,
  pub path: String,
}

/// Search the project workspace through the assistant.
/// Response: the assistant payload, verbatim.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenAssistantRequest)]
#[response(JsonValue)]
#[error(serror::Error)]
pub struct FindInProject {
  /// Id or slug
  pub project: String,
  pub pattern: String,
}

/// Get assistant app info for the project.
/// Response: the assistant payload, verbatim.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenAssistantRequest)]
#[response(JsonValue)]
#[error(serror::Error)]
pub struct GetAppInfo {
  /// Id or slug
  pub project: String,
}

/// Get a url the caller can connect to directly for the
/// assistant's event stream, bypassing the core proxy.
/// Works in any project status.
/// Response: [GetEventStreamUrlResponse].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenAssistantRequest)]
#[response(GetEventStreamUrlResponse)]
#[error(serror::Error)]
pub struct GetEventStreamUrl {
  /// Id or slug
  pub project: String,
}

#[typeshare]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GetEventStreamUrlResponse {
  pub url: String,
}
