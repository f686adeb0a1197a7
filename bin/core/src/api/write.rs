use std::time::Instant;

use anyhow::Context;
use axum::{Router, extract::Path, routing::post};
use codeopen_client::{
  api::write::*, entities::project::Project,
};
use derive_variants::{EnumVariants, ExtractVariant};
use resolver_api::Resolve;
use response::Response;
use serde::{Deserialize, Serialize};
use serde_json::json;
use serror::Json;
use typeshare::typeshare;
use uuid::Uuid;

use crate::orchestrator::{create, credentials, delete};

use super::Variant;

pub struct WriteArgs;

#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EnumVariants,
)]
#[variant_derive(Debug)]
#[args(WriteArgs)]
#[response(Response)]
#[error(serror::Error)]
#[serde(tag = "type", content = "params")]
pub enum WriteRequest {
  CreateProject(CreateProject),
  DeleteProject(DeleteProject),
  UpdateProjectCredentials(UpdateProjectCredentials),
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
  let req: WriteRequest = serde_json::from_value(json!({
    "type": variant,
    "params": params,
  }))?;
  handler(Json(req)).await
}

async fn handler(
  Json(request): Json<WriteRequest>,
) -> serror::Result<axum::response::Response> {
  let req_id = Uuid::new_v4();

  // Spawned so a dropped connection cannot cancel a saga mid
  // flight.
  let res = tokio::spawn(task(req_id, request))
    .await
    .context("failure in spawned task");

  res?
}

#[instrument(
  name = "WriteRequest",
  skip(request),
  fields(request = format!("{:?}", request.extract_variant()))
)]
async fn task(
  req_id: Uuid,
  request: WriteRequest,
) -> serror::Result<axum::response::Response> {
  let timer = Instant::now();

  let res = request.resolve(&WriteArgs).await;

  if let Err(e) = &res {
    warn!("/write request {req_id} error: {:#}", e.error);
  }

  let elapsed = timer.elapsed();
  debug!("/write request {req_id} | resolve time: {elapsed:?}");

  res.map(|res| res.0)
}

impl Resolve<WriteArgs> for CreateProject {
  async fn resolve(
    self,
    _: &WriteArgs,
  ) -> serror::Result<Project> {
    create::create_project(self).await
  }
}

impl Resolve<WriteArgs> for DeleteProject {
  async fn resolve(
    self,
    _: &WriteArgs,
  ) -> serror::Result<DeleteProjectResponse> {
    delete::delete_project_fully(self).await
  }
}

impl Resolve<WriteArgs> for UpdateProjectCredentials {
  async fn resolve(
    self,
    _: &WriteArgs,
  ) -> serror::Result<Project> {
    credentials::update_credentials(self).await
  }
}
