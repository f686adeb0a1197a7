use derive_empty_traits::EmptyTraits;
use resolver_api::{HasResponse, Resolve};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::project::Project;

pub trait CodeopenExecuteRequest: HasResponse {}

/// Start the project's container. Response: [Project].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenExecuteRequest)]
#[response(Project)]
#[error(serror::Error)]
pub struct StartProject {
  /// Id or slug
  pub project: String,
}

/// Stop the project's container. Response: [Project].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenExecuteRequest)]
#[response(Project)]
#[error(serror::Error)]
pub struct StopProject {
  /// Id or slug
  pub project: String,
}

/// Restart the project's container. Response: [Project].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenExecuteRequest)]
#[response(Project)]
#[error(serror::Error)]
pub struct RestartProject {
  /// Id or slug
  pub project: String,
}

/// Trigger a build + deploy of the project's container.
/// Response: [DeployProjectResponse].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenExecuteRequest)]
#[response(DeployProjectResponse)]
#[error(serror::Error)]
pub struct DeployProject {
  /// Id or slug
  pub project: String,
  /// Skip the platform's build cache.
  #[serde(default)]
  pub force: bool,
}

#[typeshare]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DeployProjectResponse {
  pub message: String,
  pub deployment_id: String,
}

/// Push the vault's current credentials to every running
/// project's container. Response: [SyncCredentialsResponse].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenExecuteRequest)]
#[response(SyncCredentialsResponse)]
#[error(serror::Error)]
pub struct SyncCredentialsToAllProjects {}

#[typeshare]
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SyncCredentialsResponse {
  pub updated: u32,
  pub failed: u32,
}
