use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::{I64, MongoId};

/// A coarse variant of the assistant image, eg a compute profile.
#[typeshare]
#[cfg_attr(
  feature = "mongo",
  derive(mongo_indexed::derive::MongoIndexed)
)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerFlavor {
  #[serde(
    default,
    rename = "_id",
    skip_serializing_if = "String::is_empty",
    with = "bson::serde_helpers::hex_string_as_object_id"
  )]
  pub id: MongoId,

  /// Stable identifier used in image tags, eg `base`.
  #[cfg_attr(feature = "mongo", unique_index)]
  pub flavor_id: String,

  #[serde(default)]
  pub description: String,

  /// The flavor used when the caller passes none / an unknown one.
  #[serde(default)]
  pub is_default: bool,

  #[serde(default)]
  pub sort_order: I64,
}

/// An optional feature baked into the assistant image,
/// eg a code editor or a VNC desktop.
#[typeshare]
#[cfg_attr(
  feature = "mongo",
  derive(mongo_indexed::derive::MongoIndexed)
)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerAddon {
  #[serde(
    default,
    rename = "_id",
    skip_serializing_if = "String::is_empty",
    with = "bson::serde_helpers::hex_string_as_object_id"
  )]
  pub id: MongoId,

  /// Stable identifier used in image tags, eg `code`.
  #[cfg_attr(feature = "mongo", unique_index)]
  pub addon_id: String,

  #[serde(default)]
  pub description: String,

  /// Flavors this addon can be combined with.
  #[serde(default)]
  pub compatible_flavors: Vec<String>,

  /// Extra container ports the addon listens on.
  #[serde(default)]
  pub extra_ports: Vec<u16>,

  /// Subdomain prefix for the addon's own FQDN,
  /// eg `code` -> `code-{slug}.{domain}`. Empty for none.
  #[serde(default)]
  pub fqdn_prefix: String,

  #[serde(default)]
  pub requires_gpu: bool,

  /// When multiple compatible addons are requested, the lowest
  /// sort order wins the image tag.
  #[serde(default)]
  pub sort_order: I64,
}

/// A bundle of CPU / memory / GPU limits applied at deploy time.
#[typeshare]
#[cfg_attr(
  feature = "mongo",
  derive(mongo_indexed::derive::MongoIndexed)
)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceTier {
  #[serde(
    default,
    rename = "_id",
    skip_serializing_if = "String::is_empty",
    with = "bson::serde_helpers::hex_string_as_object_id"
  )]
  pub id: MongoId,

  /// Stable identifier, eg `standard`.
  #[cfg_attr(feature = "mongo", unique_index)]
  pub tier_id: String,

  pub cpu_millis: I64,

  pub memory_mb: I64,

  #[serde(default)]
  pub gpu: bool,

  /// The tier used when the caller passes none / an unknown one.
  #[serde(default)]
  pub is_default: bool,
}

#[typeshare]
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize,
)]
pub struct ResourceLimits {
  pub cpu_millis: I64,
  pub memory_mb: I64,
}

/// Transient output of image resolution. Never persisted in full,
/// only the derived fields needed downstream are stored on the
/// project.
#[typeshare]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageResolution {
  /// `{registry}/{owner}/codeopen-{flavor}[-{addon}]:{version}`
  pub image_ref: String,
  /// Sorted, deduplicated. Always contains the base assistant port.
  pub exposed_ports: Vec<u16>,
  pub resource_limits: ResourceLimits,
  /// Comma separated `https://{fqdn}:{port}` pairs.
  /// Empty when no wildcard domain is configured.
  pub domains_config: String,
  pub requires_gpu: bool,
  pub warnings: Vec<String>,
}

/// Result of validating a (flavor, addons, tier) combination
/// without resolving it.
#[typeshare]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfigValidation {
  pub valid: bool,
  pub errors: Vec<String>,
  pub warnings: Vec<String>,
}
