use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::MongoId;

/// An LLM provider the assistant containers can be pointed at.
/// `credential_material` is opaque to everything except the
/// credential vault and never leaves the server.
#[typeshare]
#[cfg_attr(
  feature = "mongo",
  derive(mongo_indexed::derive::MongoIndexed)
)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmProvider {
  #[serde(
    default,
    rename = "_id",
    skip_serializing_if = "String::is_empty",
    with = "bson::serde_helpers::hex_string_as_object_id"
  )]
  pub id: MongoId,

  /// Abstract identifier callers refer to, eg `anthropic`.
  #[cfg_attr(feature = "mongo", unique_index)]
  pub provider_id: String,

  /// Provider family, eg `anthropic` / `openai` / `openrouter`.
  #[serde(default)]
  pub kind: String,

  /// Opaque credentials blob handed to the container as
  /// `OPENCODE_AUTH_JSON`. Only the vault reads this.
  #[serde(default)]
  pub credential_material: String,

  /// Non-secret model hint handed to the container.
  #[serde(default)]
  pub default_model: String,

  /// Used when the caller does not name a provider.
  #[serde(default)]
  pub is_default: bool,
}

/// [LlmProvider] without the credential material,
/// safe to return to callers.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmProviderListItem {
  pub id: String,
  pub provider_id: String,
  pub kind: String,
  pub default_model: String,
  pub is_default: bool,
}

impl From<&LlmProvider> for LlmProviderListItem {
  fn from(provider: &LlmProvider) -> Self {
    Self {
      id: provider.id.clone(),
      provider_id: provider.provider_id.clone(),
      kind: provider.kind.clone(),
      default_model: provider.default_model.clone(),
      is_default: provider.is_default,
    }
  }
}
