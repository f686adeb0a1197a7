//! Per-project assistant proxy plumbing: FQDN resolution with
//! write-back, the prepared client cache, and the running
//! precondition.

use std::time::Duration;

use assistant_client::AssistantClient;
use codeopen_client::entities::project::{
  Project, ProjectStatus,
};
use database::mungos::mongodb::bson::doc;

use crate::{
  config::core_config, errors, image,
  state::{assistant_clients, platform_client},
  store,
};

/// Every proxied operation except the event stream url requires
/// the container to be up.
pub fn ensure_running(project: &Project) -> serror::Result<()> {
  if project.status == ProjectStatus::Running {
    Ok(())
  } else {
    Err(errors::service_unavailable(format!(
      "project '{}' is {}, not running",
      project.slug, project.status
    )))
  }
}

/// Prepared client for the project, from the cache when
/// possible. Cache misses resolve the base url (see
/// [resolve_base_url]) and populate the cache; reads on the hot
/// path never take a write lock.
pub async fn assistant_client(
  project: &Project,
) -> serror::Result<AssistantClient> {
  if let Some(client) = assistant_clients().get(&project.id) {
    return Ok(client.clone());
  }
  let base_url = resolve_base_url(project).await?;
  let client = AssistantClient::new(
    base_url,
    Duration::from_secs(core_config().request_timeout_secs),
  );
  assistant_clients()
    .insert(project.id.clone(), client.clone());
  Ok(client)
}

/// Dropped on stop and delete so the next use re-resolves.
pub fn evict(project_id: &str) {
  assistant_clients().remove(project_id);
}

/// Cascading resolution of the project's public url:
/// 1. the cached `fqdn_url` on the record,
/// 2. the platform's assigned fqdn (written back),
/// 3. the wildcard-domain construction (written back).
/// A racing double write stores the same value twice, the field
/// is idempotent.
pub async fn resolve_base_url(
  project: &Project,
) -> serror::Result<String> {
  if let Some(fqdn) = &project.fqdn_url
    && !fqdn.is_empty()
  {
    return Ok(fqdn.clone());
  }

  match platform_client()
    .get_app(&project.platform_app_uuid)
    .await
  {
    Ok(app) => {
      if let Some(fqdn) = app.fqdn.filter(|f| !f.is_empty()) {
        let url = normalize_base_url(&fqdn);
        write_back_fqdn(&project.id, &url).await;
        return Ok(url);
      }
    }
    Err(e) => {
      debug!(
        "platform fqdn lookup failed for project {} | {e}",
        project.id
      );
    }
  }

  let config = core_config();
  if let Some(url) =
    image::primary_fqdn(&project.slug, config)
  {
    write_back_fqdn(&project.id, &url).await;
    return Ok(url);
  }

  Err(errors::config_error(format!(
    "project '{}' has no fqdn assigned and no wildcard domain is configured",
    project.slug
  )))
}

async fn write_back_fqdn(project_id: &str, url: &str) {
  if let Err(e) = store::update_project(
    project_id,
    doc! { "fqdn_url": url },
  )
  .await
  {
    warn!(
      "failed to cache fqdn for project {project_id} | {e:#}"
    );
  }
}

/// The platform hands fqdns out with or without a scheme and
/// with trailing slashes, normalize to `https://{host}`.
pub fn normalize_base_url(fqdn: &str) -> String {
  let fqdn = fqdn.trim().trim_end_matches('/');
  if fqdn.starts_with("http://") || fqdn.starts_with("https://")
  {
    fqdn.to_string()
  } else {
    format!("https://{fqdn}")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn base_urls_are_normalized() {
    assert_eq!(
      normalize_base_url("opencode-x.apps.example.com"),
      "https://opencode-x.apps.example.com"
    );
    assert_eq!(
      normalize_base_url(
        "https://opencode-x.apps.example.com/"
      ),
      "https://opencode-x.apps.example.com"
    );
    assert_eq!(
      normalize_base_url("http://internal.host"),
      "http://internal.host"
    );
  }

  #[test]
  fn only_running_projects_pass_the_precondition() {
    let mut project = Project {
      slug: String::from("x"),
      status: ProjectStatus::Running,
      ..Default::default()
    };
    assert!(ensure_running(&project).is_ok());

    for status in [
      ProjectStatus::Stopped,
      ProjectStatus::Provisioning,
      ProjectStatus::Error,
      ProjectStatus::Deleting,
    ] {
      project.status = status;
      let err = ensure_running(&project).unwrap_err();
      assert_eq!(
        err.status,
        reqwest::StatusCode::SERVICE_UNAVAILABLE
      );
    }
  }
}
