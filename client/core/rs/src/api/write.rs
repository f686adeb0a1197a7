use derive_empty_traits::EmptyTraits;
use resolver_api::{HasResponse, Resolve};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::project::Project;

pub trait CodeopenWriteRequest: HasResponse {}

/// Provision a new project: forge repo, platform application,
/// credentials, and the local record. Response: [Project].
///
/// The saga compensates all remote effects when any step fails,
/// so a failed create leaves nothing behind to clean up.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Default, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenWriteRequest)]
#[response(Project)]
#[error(serror::Error)]
pub struct CreateProject {
  /// Human name, eg `Hello World`. The slug is derived from it.
  pub name: String,
  /// Forwarded to the forge repo and platform app.
  #[serde(default)]
  pub description: String,
  /// When set, the forge repo is created by mirroring this url
  /// instead of starting empty.
  pub github_url: Option<String>,
  /// LLM provider to configure the container with.
  /// Default: the vault's default provider.
  pub llm_provider: Option<String>,
  /// Model hint to configure the container with.
  pub llm_model: Option<String>,
  /// Image flavor id. Default: the configured default flavor.
  pub flavor: Option<String>,
  /// Addon ids to bake into the image.
  #[serde(default)]
  pub addons: Vec<String>,
  /// Resource tier id. Default: the configured default tier.
  pub tier: Option<String>,
}

/// Tear a project down: container app, forge repo (optional),
/// and the local record. Response: [DeleteProjectResponse].
///
/// Remote cleanup failures are collected as warnings, the local
/// record is always removed.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenWriteRequest)]
#[response(DeleteProjectResponse)]
#[error(serror::Error)]
pub struct DeleteProject {
  /// Id or slug
  pub project: String,
  /// Also delete the forge repo. Default: true
  #[serde(default = "default_delete_repo")]
  pub delete_repo: bool,
}

fn default_delete_repo() -> bool {
  true
}

#[typeshare]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DeleteProjectResponse {
  /// Remote cleanup failures, if any.
  pub warnings: Vec<String>,
}

/// Re-sync the container's LLM credentials from the vault,
/// restarting the container if it is running. Response: [Project].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(CodeopenWriteRequest)]
#[response(Project)]
#[error(serror::Error)]
pub struct UpdateProjectCredentials {
  /// Id or slug
  pub project: String,
  /// Provider to switch to. Default: keep the project's current
  /// provider, falling back to the vault default.
  pub provider: Option<String>,
}
