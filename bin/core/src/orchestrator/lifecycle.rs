use codeopen_client::{
  api::{
    execute::{DeployProject, DeployProjectResponse},
    read::{GetProjectLogs, GetProjectLogsResponse},
  },
  entities::project::{
    Project, ProjectStatus, ProjectWithContainerStatus,
  },
};
use platform_client::UpdateApp;

use crate::{
  errors, image,
  orchestrator::{lock_project, retry::with_retry},
  proxy,
  state::platform_client,
  store,
};

/// start / stop / restart all reduce to: platform call, then
/// status transition. A platform failure moves the project to
/// Error with the failure detail and rethrows; Error is not
/// terminal, the next successful call restores the proper
/// state.
async fn transition(
  project: &str,
  action: &'static str,
  target: ProjectStatus,
) -> serror::Result<Project> {
  let project = store::get_project(project).await?;
  let _guard = lock_project(&project.id).await;
  let project = store::get_project(&project.id).await?;

  let platform = platform_client();
  let result = with_retry(action, || async {
    match action {
      "start" => {
        platform.start_app(&project.platform_app_uuid).await
      }
      "stop" => {
        platform.stop_app(&project.platform_app_uuid).await
      }
      _ => {
        platform.restart_app(&project.platform_app_uuid).await
      }
    }
  })
  .await;

  match result {
    Ok(()) => {
      store::update_status(&project.id, target, None).await?;
      if target == ProjectStatus::Stopped {
        proxy::evict(&project.id);
      }
      store::get_project(&project.id).await
    }
    Err(e) => {
      let detail =
        format!("failed to {action} project container | {e}");
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
      Err(errors::platform_error(e))
    }
  }
}

#[instrument(name = "StartProject")]
pub async fn start_project(
  project: &str,
) -> serror::Result<Project> {
  transition(project, "start", ProjectStatus::Running).await
}

#[instrument(name = "StopProject")]
pub async fn stop_project(
  project: &str,
) -> serror::Result<Project> {
  transition(project, "stop", ProjectStatus::Stopped).await
}

#[instrument(name = "RestartProject")]
pub async fn restart_project(
  project: &str,
) -> serror::Result<Project> {
  transition(project, "restart", ProjectStatus::Running).await
}

/// Triggers a platform build. The dockerfile refresh before the
/// deploy is best-effort: the platform occasionally rejects
/// dockerfile patches and will then rebuild from its cached
/// copy, which is acceptable (log-only, never surfaced).
#[instrument(name = "DeployProject", skip(req), fields(project = req.project))]
pub async fn deploy_project(
  req: DeployProject,
) -> serror::Result<DeployProjectResponse> {
  let project = store::get_project(&req.project).await?;
  let _guard = lock_project(&project.id).await;
  let project = store::get_project(&project.id).await?;
  let platform = platform_client();

  if !project.image_ref.is_empty()
    && let Err(e) = platform
      .update_app(
        &project.platform_app_uuid,
        UpdateApp {
          dockerfile: Some(image::generate_dockerfile(
            &project.image_ref,
          )),
          ..Default::default()
        },
      )
      .await
  {
    warn!(
      "dockerfile refresh rejected before deploy, deploying the platform's cached copy | project {} | {e}",
      project.id
    );
  }

  let res = platform
    .deploy_app(&project.platform_app_uuid, req.force)
    .await
    .map_err(errors::platform_error)?;

  let deployment =
    res.deployments.into_iter().next().ok_or_else(|| {
      errors::internal_error(
        "platform reported no deployment for the deploy request",
      )
    })?;

  Ok(DeployProjectResponse {
    message: deployment.message,
    deployment_id: deployment.deployment_uuid,
  })
}

pub async fn get_logs(
  req: GetProjectLogs,
) -> serror::Result<GetProjectLogsResponse> {
  let project = store::get_project(&req.project).await?;
  let logs = with_retry("get logs", || {
    platform_client()
      .get_logs(&project.platform_app_uuid, req.lines)
  })
  .await
  .map_err(errors::platform_error)?;
  Ok(GetProjectLogsResponse { logs })
}

/// The stored record merged with the platform's live container
/// status. The platform being unreachable degrades the status
/// to `unknown`, it never fails the read.
pub async fn get_project_with_status(
  project: &str,
) -> serror::Result<ProjectWithContainerStatus> {
  let project = store::get_project(project).await?;
  let container_status = match platform_client()
    .get_app(&project.platform_app_uuid)
    .await
  {
    Ok(app) if !app.status.is_empty() => app.status,
    Ok(_) => String::from("unknown"),
    Err(e) => {
      debug!(
        "failed to read container status for project {} | {e}",
        project.id
      );
      String::from("unknown")
    }
  };
  Ok(ProjectWithContainerStatus {
    project,
    container_status,
  })
}
