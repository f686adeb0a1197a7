use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::MongoId;

/// Server-side key / value setting, eg `default_provider_id`
/// or the database schema stamp.
#[typeshare]
#[cfg_attr(
  feature = "mongo",
  derive(mongo_indexed::derive::MongoIndexed)
)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Setting {
  #[serde(
    default,
    rename = "_id",
    skip_serializing_if = "String::is_empty",
    with = "bson::serde_helpers::hex_string_as_object_id"
  )]
  pub id: MongoId,

  #[cfg_attr(feature = "mongo", unique_index)]
  pub key: String,

  #[serde(default)]
  pub value: String,
}
