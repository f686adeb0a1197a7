use serde::{Deserialize, Serialize};
use strum::Display;
use typeshare::typeshare;

use crate::entities::{I64, MongoId};

/// The root aggregate of the control plane.
/// One Project owns one forge repo and one platform application
/// running the assistant container.
#[typeshare]
#[cfg_attr(
  feature = "mongo",
  derive(mongo_indexed::derive::MongoIndexed)
)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
  /// The Mongo ID of the project.
  /// This field is de/serialized from/to JSON as
  /// `{ "_id": { "$oid": "..." }, ...(rest of serialized Project) }`
  #[serde(
    default,
    rename = "_id",
    skip_serializing_if = "String::is_empty",
    with = "bson::serde_helpers::hex_string_as_object_id"
  )]
  pub id: MongoId,

  /// The human-given project name, eg `Hello World`.
  pub name: String,

  /// URL-safe identifier derived from the name, eg `hello-world`.
  /// Unique across non-deleted projects. Immutable.
  #[cfg_attr(feature = "mongo", unique_index)]
  pub slug: String,

  /// Optional description, forwarded to the forge repo
  /// and the platform app.
  #[serde(default)]
  pub description: String,

  /// Repo id assigned by the forge. Immutable.
  pub forge_repo_id: I64,

  /// Owner (user / org) of the forge repo. Immutable.
  pub forge_owner: String,

  /// Application uuid assigned by the container platform. Immutable.
  pub platform_app_uuid: String,

  /// Port derived from the forge repo id within the configured
  /// range. Stable for the project's lifetime.
  pub container_port: u16,

  /// Lifecycle state, mutated only through the orchestrator.
  #[cfg_attr(feature = "mongo", index)]
  #[serde(default)]
  pub status: ProjectStatus,

  /// Free text detail of the last error, verbatim.
  #[serde(default)]
  pub status_detail: String,

  /// Public URL assigned by the platform, cached once known.
  #[serde(default)]
  pub fqdn_url: Option<String>,

  /// The LLM provider the container was last configured with.
  #[serde(default)]
  pub llm_provider_id: String,

  /// The model hint the container was last configured with.
  #[serde(default)]
  pub llm_model_id: String,

  /// Public https clone URL of the forge repo,
  /// passed to the spawned container.
  #[serde(default)]
  pub clone_url_public: String,

  /// The assistant image the platform app was created from.
  /// Deploys regenerate the Dockerfile from it.
  #[serde(default)]
  pub image_ref: String,

  #[serde(default)]
  pub created_at: I64,

  #[serde(default)]
  pub updated_at: I64,

  /// Monotonic timestamp of the last status transition.
  #[serde(default)]
  pub status_updated_at: I64,
}

#[typeshare]
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProjectStatus {
  /// The create saga is still driving remote systems.
  Provisioning,
  /// The container app exists but is not running.
  #[default]
  Stopped,
  /// The container app is running.
  Running,
  /// The last lifecycle call failed. Not terminal, a later
  /// successful call restores the appropriate state.
  Error,
  /// The delete saga is tearing the project down.
  Deleting,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectListItem {
  pub id: String,
  pub name: String,
  pub slug: String,
  pub status: ProjectStatus,
  pub fqdn_url: Option<String>,
  pub llm_provider_id: String,
  pub updated_at: I64,
}

impl From<&Project> for ProjectListItem {
  fn from(project: &Project) -> Self {
    Self {
      id: project.id.clone(),
      name: project.name.clone(),
      slug: project.slug.clone(),
      status: project.status,
      fqdn_url: project.fqdn_url.clone(),
      llm_provider_id: project.llm_provider_id.clone(),
      updated_at: project.updated_at,
    }
  }
}

/// Stored project merged with the live container status
/// reported by the platform.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectWithContainerStatus {
  pub project: Project,
  /// Platform-reported status, or `unknown` if the platform
  /// could not be reached.
  pub container_status: String,
}
