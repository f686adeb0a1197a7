use std::time::Instant;

use anyhow::Context;
use axum::{Router, extract::Path, routing::post};
use codeopen_client::{
  api::execute::*, entities::project::Project,
};
use derive_variants::{EnumVariants, ExtractVariant};
use resolver_api::Resolve;
use response::Response;
use serde::{Deserialize, Serialize};
use serde_json::json;
use serror::Json;
use typeshare::typeshare;
use uuid::Uuid;

use crate::orchestrator::{credentials, lifecycle};

use super::Variant;

pub struct ExecuteArgs;

#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EnumVariants,
)]
#[variant_derive(Debug)]
#[args(ExecuteArgs)]
#[response(Response)]
#[error(serror::Error)]
#[serde(tag = "type", content = "params")]
pub enum ExecuteRequest {
  StartProject(StartProject),
  StopProject(StopProject),
  RestartProject(RestartProject),
  DeployProject(DeployProject),
  SyncCredentialsToAllProjects(SyncCredentialsToAllProjects),
}

pub fn router() -> Router {
  Router::new()
    .route("/", post(handler))
    .route("/{variant}", post(variant_handler))
}

async fn variant_handler(
  Path(Variant { variant }): Path<Variant>,
  Json(params): Json<serde_json::Value>,
) -> serror::Result<axum::response::Response> {
  let req: ExecuteRequest = serde_json::from_value(json!({
    "type": variant,
    "params": params,
  }))?;
  handler(Json(req)).await
}

async fn handler(
  Json(request): Json<ExecuteRequest>,
) -> serror::Result<axum::response::Response> {
  let req_id = Uuid::new_v4();

  // Spawned so a dropped connection cannot cancel a lifecycle
  // operation mid flight.
  let res = tokio::spawn(task(req_id, request))
    .await
    .context("failure in spawned task");

  res?
}

#[instrument(
  name = "ExecuteRequest",
  skip(request),
  fields(request = format!("{:?}", request.extract_variant()))
)]
async fn task(
  req_id: Uuid,
  request: ExecuteRequest,
) -> serror::Result<axum::response::Response> {
  let timer = Instant::now();

  let res = request.resolve(&ExecuteArgs).await;

  if let Err(e) = &res {
    warn!("/execute request {req_id} error: {:#}", e.error);
  }

  let elapsed = timer.elapsed();
  debug!(
    "/execute request {req_id} | resolve time: {elapsed:?}"
  );

  res.map(|res| res.0)
}

impl Resolve<ExecuteArgs> for StartProject {
  async fn resolve(
    self,
    _: &ExecuteArgs,
  ) -> serror::Result<Project> {
    lifecycle::start_project(&self.project).await
  }
}

impl Resolve<ExecuteArgs> for StopProject {
  async fn resolve(
    self,
    _: &ExecuteArgs,
  ) -> serror::Result<Project> {
    lifecycle::stop_project(&self.project).await
  }
}

impl Resolve<ExecuteArgs> for RestartProject {
  async fn resolve(
    self,
    _: &ExecuteArgs,
  ) -> serror::Result<Project> {
    lifecycle::restart_project(&self.project).await
  }
}

impl Resolve<ExecuteArgs> for DeployProject {
  async fn resolve(
    self,
    _: &ExecuteArgs,
  ) -> serror::Result<DeployProjectResponse> {
    lifecycle::deploy_project(self).await
  }
}

impl Resolve<ExecuteArgs> for SyncCredentialsToAllProjects {
  async fn resolve(
    self,
    _: &ExecuteArgs,
  ) -> serror::Result<SyncCredentialsResponse> {
    credentials::sync_credentials_to_all_projects().await
  }
}
