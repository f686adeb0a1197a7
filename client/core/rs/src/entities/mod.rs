use async_timing_util::unix_timestamp_ms;
use serde::{Deserialize, Serialize};
use serror::Serror;
use typeshare::typeshare;

/// [AssistantEvent][assistant::AssistantEvent] and message parts.
pub mod assistant;
/// [CoreConfig][config::CoreConfig] and the env override surface.
pub mod config;
/// [ContainerFlavor][image::ContainerFlavor],
/// [ContainerAddon][image::ContainerAddon],
/// [ResourceTier][image::ResourceTier], and
/// [ImageResolution][image::ImageResolution].
pub mod image;
/// Subtypes of [LogConfig][logger::LogConfig].
pub mod logger;
/// Subtypes of [Project][project::Project].
pub mod project;
/// Subtypes of [LlmProvider][provider::LlmProvider].
pub mod provider;
/// [Setting][setting::Setting] key / value records.
pub mod setting;

#[typeshare(serialized_as = "number")]
pub type I64 = i64;
#[typeshare(serialized_as = "number")]
pub type U64 = u64;
#[typeshare(serialized_as = "any")]
pub type JsonValue = serde_json::Value;
#[typeshare(serialized_as = "MongoIdObj")]
pub type MongoId = String;
#[typeshare(serialized_as = "__Serror")]
pub type _Serror = Serror;

#[typeshare]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MongoIdObj {
  #[serde(rename = "$oid")]
  pub oid: String,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct __Serror {
  pub error: String,
  pub trace: Vec<String>,
}

/// Unix timestamp in milliseconds as i64
pub fn codeopen_timestamp() -> i64 {
  unix_timestamp_ms() as i64
}

pub fn optional_string(string: impl Into<String>) -> Option<String> {
  let string = string.into();
  if string.is_empty() { None } else { Some(string) }
}
