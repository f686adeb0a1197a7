use derive_empty_traits::EmptyTraits;
use resolver_api::{HasResponse, Resolve};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::{
  U64,
  image::{
    ContainerAddon, ContainerFlavor, ProjectConfigValidation,
    ResourceTier,
  },
  project::{ProjectListItem, ProjectWithContainerStatus},
  provider::LlmProviderListItem,
};

pub trait CodeopenReadRequest: HasResponse {}

/// Get the core api version. Response: [GetVersionResponse].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenReadRequest)]
#[response(GetVersionResponse)]
#[error(serror::Error)]
pub struct GetVersion {}

#[typeshare]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GetVersionResponse {
  pub version: String,
}

/// Get capability info about this core instance.
/// Response: [GetCoreInfoResponse].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenReadRequest)]
#[response(GetCoreInfoResponse)]
#[error(serror::Error)]
pub struct GetCoreInfo {}

#[typeshare]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GetCoreInfoResponse {
  pub version: String,
  /// Whether a wildcard domain is configured, ie whether
  /// projects get public FQDNs generated for them.
  pub wildcard_domain_enabled: bool,
  pub image_registry: String,
  pub image_owner: String,
}

/// Get a project along with the live container status reported
/// by the platform. Response: [ProjectWithContainerStatus].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenReadRequest)]
#[response(ProjectWithContainerStatus)]
#[error(serror::Error)]
pub struct GetProject {
  /// Id or slug
  pub project: String,
}

/// List all projects. Response: [ListProjectsResponse].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenReadRequest)]
#[response(ListProjectsResponse)]
#[error(serror::Error)]
pub struct ListProjects {}

#[typeshare]
pub type ListProjectsResponse = Vec<ProjectListItem>;

/// Get recent container logs for a project.
/// Response: [GetProjectLogsResponse].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenReadRequest)]
#[response(GetProjectLogsResponse)]
#[error(serror::Error)]
pub struct GetProjectLogs {
  /// Id or slug
  pub project: String,
  /// Number of log lines to fetch. Default: 100
  #[serde(default = "default_log_lines")]
  pub lines: U64,
}

fn default_log_lines() -> u64 {
  100
}

#[typeshare]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GetProjectLogsResponse {
  /// Newline joined log text.
  pub logs: String,
}

/// List configured LLM providers, without credential material.
/// Response: [ListProvidersResponse].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenReadRequest)]
#[response(ListProvidersResponse)]
#[error(serror::Error)]
pub struct ListProviders {}

#[typeshare]
pub type ListProvidersResponse = Vec<LlmProviderListItem>;

/// List available container flavors.
/// Response: [ListContainerFlavorsResponse].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenReadRequest)]
#[response(ListContainerFlavorsResponse)]
#[error(serror::Error)]
pub struct ListContainerFlavors {}

#[typeshare]
pub type ListContainerFlavorsResponse = Vec<ContainerFlavor>;

/// List available container addons.
/// Response: [ListContainerAddonsResponse].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenReadRequest)]
#[response(ListContainerAddonsResponse)]
#[error(serror::Error)]
pub struct ListContainerAddons {}

#[typeshare]
pub type ListContainerAddonsResponse = Vec<ContainerAddon>;

/// List available resource tiers.
/// Response: [ListResourceTiersResponse].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenReadRequest)]
#[response(ListResourceTiersResponse)]
#[error(serror::Error)]
pub struct ListResourceTiers {}

#[typeshare]
pub type ListResourceTiersResponse = Vec<ResourceTier>;

/// Validate a (flavor, addons, tier) combination without
/// resolving it. Response: [ProjectConfigValidation].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenReadRequest)]
#[response(ProjectConfigValidation)]
#[error(serror::Error)]
pub struct ValidateProjectConfig {
  pub flavor: Option<String>,
  #[serde(default)]
  pub addons: Vec<String>,
  pub tier: Option<String>,
}
