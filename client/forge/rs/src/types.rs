use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForgeUser {
  pub id: i64,
  pub login: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub full_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForgeRepo {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub full_name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub private: bool,
  #[serde(default)]
  pub clone_url: String,
  #[serde(default)]
  pub html_url: String,
  #[serde(default)]
  pub ssh_url: String,
  #[serde(default)]
  pub default_branch: String,
  #[serde(default)]
  pub owner: ForgeUser,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRepoBody {
  pub name: String,
  #[serde(default)]
  pub description: String,
  pub private: bool,
  /// Initialize with a first commit so the repo is cloneable
  /// immediately.
  pub auto_init: bool,
  pub default_branch: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MirrorRepoBody {
  /// Url of the repo to clone from.
  pub clone_addr: String,
  /// Name of the repo created on the forge.
  pub repo_name: String,
  #[serde(default)]
  pub description: String,
  pub private: bool,
  /// Always false: one-shot clone, not a syncing mirror.
  pub mirror: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentsEntry {
  pub name: String,
  pub path: String,
  /// `file` / `dir` / `symlink` / `submodule`
  #[serde(rename = "type")]
  pub kind: String,
  #[serde(default)]
  pub size: i64,
  /// Base64 file contents, present for file reads only.
  #[serde(default)]
  pub content: Option<String>,
}

/// The forge contents endpoint returns a single entry for file
/// paths and a list for directory paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentsResponse {
  Dir(Vec<ContentsEntry>),
  File(Box<ContentsEntry>),
}
