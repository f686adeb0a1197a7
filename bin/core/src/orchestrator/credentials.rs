use codeopen_client::{
  api::{
    execute::SyncCredentialsResponse,
    write::UpdateProjectCredentials,
  },
  entities::{
    optional_string,
    project::{Project, ProjectStatus},
  },
};
use database::mungos::mongodb::bson::doc;
use futures::future::join_all;

use crate::{
  errors,
  orchestrator::{
    environment::{self, EnvInputs},
    lock_project,
    retry::with_retry,
  },
  state::platform_client,
  store, vault,
};

/// Re-composes the container env from the vault and pushes it
/// to the platform. Only a running container is restarted so it
/// re-reads credentials at boot; a stopped one picks them up on
/// its next start.
#[instrument(name = "UpdateProjectCredentials", skip(req), fields(project = req.project))]
pub async fn update_credentials(
  req: UpdateProjectCredentials,
) -> serror::Result<Project> {
  let project = store::get_project(&req.project).await?;
  let _guard = lock_project(&project.id).await;
  let project = store::get_project(&project.id).await?;

  let provider_id = match req.provider {
    Some(id) => Some(id),
    None => {
      match optional_string(&project.llm_provider_id) {
        Some(current) => Some(current),
        None => vault::default_provider_id().await?,
      }
    }
  };
  let credential_env =
    vault::get_env_vars(provider_id.as_deref()).await?;

  // Full env composition, identical to the create saga: base
  // vars keep precedence over credential vars.
  let env = environment::compose_env(
    crate::config::core_config(),
    EnvInputs {
      project_name: &project.name,
      clone_url_public: &project.clone_url_public,
      credential_env: &credential_env,
    },
  );

  let platform = platform_client();
  with_retry("set env vars", || {
    platform.bulk_set_env_vars(&project.platform_app_uuid, &env)
  })
  .await
  .map_err(errors::platform_error)?;

  store::update_project(
    &project.id,
    doc! {
      "llm_provider_id": provider_id.clone().unwrap_or_default(),
    },
  )
  .await?;

  if project.status == ProjectStatus::Running {
    if let Err(e) = with_retry("restart app", || {
      platform.restart_app(&project.platform_app_uuid)
    })
    .await
    {
      let detail = format!(
        "credentials written, but the container restart failed | {e}"
      );
      if let Err(status_err) = store::update_status(
        &project.id,
        ProjectStatus::Error,
        Some(&detail),
      )
      .await
      {
        warn!(
          "failed to record error status for project {} | {status_err:#}",
          project.id
        );
      }
      return Err(errors::platform_error(e));
    }
    // Restart keeps the project running.
    store::update_status(
      &project.id,
      ProjectStatus::Running,
      None,
    )
    .await?;
  }

  store::get_project(&project.id).await
}

/// Pushes the vault's current credentials to every running
/// project. Failures are counted, never propagated: one broken
/// project must not stall the broadcast.
#[instrument(name = "SyncCredentialsToAllProjects")]
pub async fn sync_credentials_to_all_projects()
-> serror::Result<SyncCredentialsResponse> {
  let running =
    store::list_projects_by_status(ProjectStatus::Running)
      .await?;

  // Distinct projects fan out freely, each update serializes
  // on its own project lock.
  let results =
    join_all(running.into_iter().map(|project| async move {
      let id = project.id.clone();
      let slug = project.slug.clone();
      let res = update_credentials(UpdateProjectCredentials {
        project: id,
        provider: None,
      })
      .await;
      if let Err(e) = &res {
        warn!(
          "credential sync failed for project '{slug}' | {:#}",
          e.error
        );
      }
      res.is_ok()
    }))
    .await;

  let updated = results.iter().filter(|ok| **ok).count() as u32;
  let failed = results.len() as u32 - updated;
  info!(
    "credential sync complete | updated: {updated} | failed: {failed}"
  );
  Ok(SyncCredentialsResponse { updated, failed })
}
