//! Thin typed client over the container platform (Coolify
//! compatible) REST api. One remote call per method, no retries.
//! Retry policy belongs to the orchestrator, which keeps this
//! client testable against plain http fixtures.
//!
//! Platform quirks reproduced here on purpose:
//! - start / stop / restart / deploy use GET semantics.
//! - The dockerfile travels base-64 encoded, exactly once.
//! - The logs endpoint answers in three different shapes.
//! - Every stored env var grows a preview twin.

use std::{collections::HashMap, time::Duration};

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

mod error;
mod logs;
mod types;

pub use error::PlatformError;
pub use logs::normalize_logs;
pub use types::*;

#[derive(Clone)]
pub struct PlatformClient {
  address: String,
  token: String,
  reqwest: reqwest::Client,
}

impl PlatformClient {
  /// `address` is the base url of the platform,
  /// eg `https://coolify.example.com`.
  pub fn new(
    address: impl Into<String>,
    token: impl Into<String>,
    timeout: Duration,
  ) -> PlatformClient {
    PlatformClient {
      address: address.into().trim_end_matches('/').to_string(),
      token: token.into(),
      reqwest: reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("failed to build platform http client"),
    }
  }

  /// Startup discovery.
  pub async fn list_servers(
    &self,
  ) -> Result<Vec<PlatformServer>, PlatformError> {
    let req = self
      .reqwest
      .get(format!("{}/api/v1/servers", self.address));
    self.resolve(req).await
  }

  /// Startup discovery.
  pub async fn list_projects(
    &self,
  ) -> Result<Vec<PlatformProject>, PlatformError> {
    let req = self
      .reqwest
      .get(format!("{}/api/v1/projects", self.address));
    self.resolve(req).await
  }

  /// The dockerfile is sent base-64 encoded because the platform
  /// requires it, and because it sidesteps the platform's git url
  /// rewriting defects.
  pub async fn create_app_from_dockerfile(
    &self,
    project_uuid: &str,
    server_uuid: &str,
    environment_name: &str,
    app: CreateAppFromDockerfile,
  ) -> Result<CreatedApp, PlatformError> {
    let body = json!({
      "project_uuid": project_uuid,
      "server_uuid": server_uuid,
      "environment_name": environment_name,
      "name": app.name,
      "description": app.description,
      "dockerfile": STANDARD.encode(&app.dockerfile),
      "ports_exposes": app.ports_exposes,
      "domains": app.domains,
      "instant_deploy": app.instant_deploy,
      "health_check_enabled": app.health_check.enabled,
      "health_check_path": app.health_check.path,
      "health_check_port": app.health_check.port,
    });
    let req = self
      .reqwest
      .post(format!(
        "{}/api/v1/applications/dockerfile",
        self.address
      ))
      .json(&body);
    self.resolve(req).await
  }

  /// Create from a prebuilt registry image instead of a
  /// dockerfile build.
  pub async fn create_app_from_docker_image(
    &self,
    project_uuid: &str,
    server_uuid: &str,
    environment_name: &str,
    app: CreateAppFromDockerImage,
  ) -> Result<CreatedApp, PlatformError> {
    let body = json!({
      "project_uuid": project_uuid,
      "server_uuid": server_uuid,
      "environment_name": environment_name,
      "name": app.name,
      "description": app.description,
      "docker_registry_image_name": app.docker_registry_image_name,
      "docker_registry_image_tag": app.docker_registry_image_tag,
      "ports_exposes": app.ports_exposes,
      "domains": app.domains,
      "instant_deploy": app.instant_deploy,
      "health_check_enabled": app.health_check.enabled,
      "health_check_path": app.health_check.path,
      "health_check_port": app.health_check.port,
    });
    let req = self
      .reqwest
      .post(format!(
        "{}/api/v1/applications/dockerimage",
        self.address
      ))
      .json(&body);
    self.resolve(req).await
  }

  /// Patch application settings. Used after create to re-assert
  /// ports / domains / health check, which the create endpoint
  /// does not reliably accept.
  pub async fn update_app(
    &self,
    app_uuid: &str,
    update: UpdateApp,
  ) -> Result<(), PlatformError> {
    let mut body = serde_json::to_value(&update).map_err(|e| {
      PlatformError::Protocol {
        message: format!("failed to serialize update | {e}"),
      }
    })?;
    if let Some(dockerfile) = &update.dockerfile
      && let Value::Object(map) = &mut body
    {
      map.insert(
        String::from("dockerfile"),
        Value::String(STANDARD.encode(dockerfile)),
      );
    }
    let req = self
      .reqwest
      .patch(format!(
        "{}/api/v1/applications/{app_uuid}",
        self.address
      ))
      .json(&body);
    let res = self.send(req).await?;
    Self::check_status(res).await?;
    Ok(())
  }

  pub async fn get_app(
    &self,
    app_uuid: &str,
  ) -> Result<App, PlatformError> {
    let req = self.reqwest.get(format!(
      "{}/api/v1/applications/{app_uuid}",
      self.address
    ));
    self.resolve(req).await
  }

  pub async fn delete_app(
    &self,
    app_uuid: &str,
  ) -> Result<(), PlatformError> {
    let req = self.reqwest.delete(format!(
      "{}/api/v1/applications/{app_uuid}",
      self.address
    ));
    let res = self.send(req).await?;
    Self::check_status(res).await?;
    Ok(())
  }

  /// A request, not a confirmation. Poll [Self::get_app] for the
  /// resulting status.
  pub async fn start_app(
    &self,
    app_uuid: &str,
  ) -> Result<(), PlatformError> {
    self.lifecycle(app_uuid, "start").await
  }

  /// A request, not a confirmation. Poll [Self::get_app] for the
  /// resulting status.
  pub async fn stop_app(
    &self,
    app_uuid: &str,
  ) -> Result<(), PlatformError> {
    self.lifecycle(app_uuid, "stop").await
  }

  /// A request, not a confirmation. Poll [Self::get_app] for the
  /// resulting status.
  pub async fn restart_app(
    &self,
    app_uuid: &str,
  ) -> Result<(), PlatformError> {
    self.lifecycle(app_uuid, "restart").await
  }

  // The platform uses GET for lifecycle actions.
  async fn lifecycle(
    &self,
    app_uuid: &str,
    action: &str,
  ) -> Result<(), PlatformError> {
    let req = self.reqwest.get(format!(
      "{}/api/v1/applications/{app_uuid}/{action}",
      self.address
    ));
    let res = self.send(req).await?;
    Self::check_status(res).await?;
    Ok(())
  }

  /// Triggers a build. `GET /deploy?uuid=..[&force=true]`.
  pub async fn deploy_app(
    &self,
    app_uuid: &str,
    force: bool,
  ) -> Result<DeployResponse, PlatformError> {
    let mut req = self
      .reqwest
      .get(format!("{}/api/v1/deploy", self.address))
      .query(&[("uuid", app_uuid)]);
    if force {
      req = req.query(&[("force", "true")]);
    }
    self.resolve(req).await
  }

  pub async fn get_logs(
    &self,
    app_uuid: &str,
    lines: u64,
  ) -> Result<String, PlatformError> {
    let req = self
      .reqwest
      .get(format!(
        "{}/api/v1/applications/{app_uuid}/logs",
        self.address
      ))
      .query(&[("lines", lines.to_string())]);
    let body: Value = self.resolve(req).await?;
    Ok(normalize_logs(body))
  }

  /// `filter_preview` drops the preview twins the platform
  /// creates for every stored variable.
  pub async fn list_env_vars(
    &self,
    app_uuid: &str,
    filter_preview: bool,
  ) -> Result<Vec<EnvVar>, PlatformError> {
    let req = self.reqwest.get(format!(
      "{}/api/v1/applications/{app_uuid}/envs",
      self.address
    ));
    let vars: Vec<EnvVar> = self.resolve(req).await?;
    if filter_preview {
      Ok(vars.into_iter().filter(|v| !v.is_preview).collect())
    } else {
      Ok(vars)
    }
  }

  /// Preferred over per-variable writes: the bulk endpoint avoids
  /// the race when the platform creates preview twins
  /// concurrently.
  pub async fn bulk_set_env_vars(
    &self,
    app_uuid: &str,
    env: &HashMap<String, String>,
  ) -> Result<(), PlatformError> {
    let mut keys = env.keys().collect::<Vec<_>>();
    keys.sort();
    let data = keys
      .into_iter()
      .map(|key| {
        json!({
          "key": key,
          "value": env[key],
          "is_preview": false,
        })
      })
      .collect::<Vec<_>>();
    let req = self
      .reqwest
      .patch(format!(
        "{}/api/v1/applications/{app_uuid}/envs/bulk",
        self.address
      ))
      .json(&json!({ "data": data }));
    let res = self.send(req).await?;
    Self::check_status(res).await?;
    Ok(())
  }

  pub async fn delete_env_var(
    &self,
    app_uuid: &str,
    env_uuid: &str,
  ) -> Result<(), PlatformError> {
    let req = self.reqwest.delete(format!(
      "{}/api/v1/applications/{app_uuid}/envs/{env_uuid}",
      self.address
    ));
    let res = self.send(req).await?;
    Self::check_status(res).await?;
    Ok(())
  }

  async fn resolve<T: DeserializeOwned>(
    &self,
    req: reqwest::RequestBuilder,
  ) -> Result<T, PlatformError> {
    let res = self.send(req).await?;
    let res = Self::check_status(res).await?;
    let text = res.text().await.map_err(|e| {
      PlatformError::Protocol {
        message: format!("failed to read response body | {e}"),
      }
    })?;
    serde_json::from_str(&text).map_err(|e| {
      PlatformError::Protocol {
        message: format!(
          "failed to parse response body | {e} | body: {text}"
        ),
      }
    })
  }

  async fn send(
    &self,
    req: reqwest::RequestBuilder,
  ) -> Result<reqwest::Response, PlatformError> {
    req
      .header("Authorization", format!("Bearer {}", self.token))
      .send()
      .await
      .map_err(|e| PlatformError::Transport {
        message: format!("{e:?}"),
      })
  }

  async fn check_status(
    res: reqwest::Response,
  ) -> Result<reqwest::Response, PlatformError> {
    let status = res.status();
    if status.is_success() {
      return Ok(res);
    }
    let retry_after = error::parse_retry_after(res.headers());
    let message = res.text().await.unwrap_or_default();
    Err(match status.as_u16() {
      401 | 403 => PlatformError::Auth { message },
      404 => PlatformError::NotFound { message },
      409 => PlatformError::Conflict { message },
      429 => PlatformError::RateLimited { retry_after },
      _ => PlatformError::Upstream {
        status: status.as_u16(),
        message,
      },
    })
  }
}
