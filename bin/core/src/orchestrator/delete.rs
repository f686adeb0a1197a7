use codeopen_client::{
  api::write::{DeleteProject, DeleteProjectResponse},
  entities::project::ProjectStatus,
};
use forge_client::ForgeError;
use formatting::format_warning;
use platform_client::PlatformError;

use crate::{
  orchestrator::{lock_project, retry::with_retry},
  proxy,
  state::{forge_client, platform_client},
  store,
};

/// The delete saga. Cleanup intent wins: remote failures are
/// collected as warnings instead of aborting, and the local
/// record is removed last, unconditionally. Preserving the
/// record on remote cleanup failure would leave an
/// unrecoverable zombie the user can see but never remove.
#[instrument(name = "DeleteProject", skip(req), fields(project = req.project))]
pub async fn delete_project_fully(
  req: DeleteProject,
) -> serror::Result<DeleteProjectResponse> {
  let project = store::get_project(&req.project).await?;
  let _guard = lock_project(&project.id).await;
  // Re-read under the lock: a racing delete may have won.
  let project = store::get_project(&project.id).await?;

  store::update_status(
    &project.id,
    ProjectStatus::Deleting,
    None,
  )
  .await?;

  let mut warnings = Vec::new();
  let platform = platform_client();

  if project.status == ProjectStatus::Running
    && let Err(e) = platform.stop_app(&project.platform_app_uuid).await
  {
    // Best effort, the app is deleted next anyway.
    debug!(
      "failed to stop app before delete | project {} | {e}",
      project.id
    );
  }

  match with_retry("delete platform app", || {
    platform.delete_app(&project.platform_app_uuid)
  })
  .await
  {
    Ok(()) | Err(PlatformError::NotFound { .. }) => {}
    Err(e) => {
      warnings.push(format_warning("platform", &e));
      warn!(
        "failed to delete platform app for project {} | {e}",
        project.id
      );
    }
  }

  if req.delete_repo {
    match with_retry("delete forge repo", || {
      forge_client()
        .delete_repo(&project.forge_owner, &project.slug)
    })
    .await
    {
      Ok(()) | Err(ForgeError::NotFound { .. }) => {}
      Err(e) => {
        warnings.push(format_warning("forge", &e));
        warn!(
          "failed to delete forge repo for project {} | {e}",
          project.id
        );
      }
    }
  }

  proxy::evict(&project.id);

  // Always last. The local record is the user-facing source of
  // truth.
  store::delete_project(&project.id).await?;

  info!(
    "deleted project '{}' ({}) | {} warning/s",
    project.slug,
    project.id,
    warnings.len()
  );
  Ok(DeleteProjectResponse { warnings })
}
