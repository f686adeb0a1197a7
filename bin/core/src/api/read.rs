use std::time::Instant;

use anyhow::Context;
use axum::{Router, extract::Path, routing::post};
use codeopen_client::{
  api::read::*,
  entities::{
    image::ProjectConfigValidation,
    project::ProjectWithContainerStatus,
  },
};
use database::mungos::{find::find_collect, mongodb::bson::doc};
use derive_variants::{EnumVariants, ExtractVariant};
use resolver_api::Resolve;
use response::Response;
use serde::{Deserialize, Serialize};
use serde_json::json;
use serror::Json;
use typeshare::typeshare;
use uuid::Uuid;

use crate::{
  config::core_config,
  image::{self, ResolveParams},
  orchestrator::{create::load_catalog, lifecycle},
  state::db_client,
  store,
};

use super::Variant;

pub struct ReadArgs;

#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EnumVariants,
)]
#[variant_derive(Debug)]
#[args(ReadArgs)]
#[response(Response)]
#[error(serror::Error)]
#[serde(tag = "type", content = "params")]
pub enum ReadRequest {
  GetVersion(GetVersion),
  GetCoreInfo(GetCoreInfo),
  GetProject(GetProject),
  ListProjects(ListProjects),
  GetProjectLogs(GetProjectLogs),
  ListProviders(ListProviders),
  ListContainerFlavors(ListContainerFlavors),
  ListContainerAddons(ListContainerAddons),
  ListResourceTiers(ListResourceTiers),
  ValidateProjectConfig(ValidateProjectConfig),
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
  let req: ReadRequest = serde_json::from_value(json!({
    "type": variant,
    "params": params,
  }))?;
  handler(Json(req)).await
}

async fn handler(
  Json(request): Json<ReadRequest>,
) -> serror::Result<axum::response::Response> {
  let req_id = Uuid::new_v4();
  let timer = Instant::now();
  debug!(
    "/read request {req_id} | {:?}",
    request.extract_variant()
  );

  let res = request.resolve(&ReadArgs).await;

  if let Err(e) = &res {
    warn!("/read request {req_id} error: {:#}", e.error);
  }

  let elapsed = timer.elapsed();
  debug!("/read request {req_id} | resolve time: {elapsed:?}");

  res.map(|res| res.0)
}

impl Resolve<ReadArgs> for GetVersion {
  async fn resolve(
    self,
    _: &ReadArgs,
  ) -> serror::Result<GetVersionResponse> {
    Ok(GetVersionResponse {
      version: env!("CARGO_PKG_VERSION").to_string(),
    })
  }
}

impl Resolve<ReadArgs> for GetCoreInfo {
  async fn resolve(
    self,
    _: &ReadArgs,
  ) -> serror::Result<GetCoreInfoResponse> {
    let config = core_config();
    Ok(GetCoreInfoResponse {
      version: env!("CARGO_PKG_VERSION").to_string(),
      wildcard_domain_enabled: !config
        .wildcard_domain
        .is_empty(),
      image_registry: config.image_registry.clone(),
      image_owner: config.image_owner.clone(),
    })
  }
}

impl Resolve<ReadArgs> for GetProject {
  async fn resolve(
    self,
    _: &ReadArgs,
  ) -> serror::Result<ProjectWithContainerStatus> {
    lifecycle::get_project_with_status(&self.project).await
  }
}

impl Resolve<ReadArgs> for ListProjects {
  async fn resolve(
    self,
    _: &ReadArgs,
  ) -> serror::Result<ListProjectsResponse> {
    let projects = store::list_projects().await?;
    Ok(projects.iter().map(Into::into).collect())
  }
}

impl Resolve<ReadArgs> for GetProjectLogs {
  async fn resolve(
    self,
    _: &ReadArgs,
  ) -> serror::Result<GetProjectLogsResponse> {
    lifecycle::get_logs(self).await
  }
}

impl Resolve<ReadArgs> for ListProviders {
  async fn resolve(
    self,
    _: &ReadArgs,
  ) -> serror::Result<ListProvidersResponse> {
    let providers =
      find_collect(&db_client().providers, doc! {}, None)
        .await
        .context("failed to list providers")?;
    Ok(providers.iter().map(Into::into).collect())
  }
}

impl Resolve<ReadArgs> for ListContainerFlavors {
  async fn resolve(
    self,
    _: &ReadArgs,
  ) -> serror::Result<ListContainerFlavorsResponse> {
    let mut flavors = find_collect(
      &db_client().container_flavors,
      doc! {},
      None,
    )
    .await
    .context("failed to list container flavors")?;
    flavors.sort_by_key(|f| f.sort_order);
    Ok(flavors)
  }
}

impl Resolve<ReadArgs> for ListContainerAddons {
  async fn resolve(
    self,
    _: &ReadArgs,
  ) -> serror::Result<ListContainerAddonsResponse> {
    let mut addons = find_collect(
      &db_client().container_addons,
      doc! {},
      None,
    )
    .await
    .context("failed to list container addons")?;
    addons.sort_by_key(|a| a.sort_order);
    Ok(addons)
  }
}

impl Resolve<ReadArgs> for ListResourceTiers {
  async fn resolve(
    self,
    _: &ReadArgs,
  ) -> serror::Result<ListResourceTiersResponse> {
    find_collect(&db_client().resource_tiers, doc! {}, None)
      .await
      .context("failed to list resource tiers")
      .map_err(Into::into)
  }
}

impl Resolve<ReadArgs> for ValidateProjectConfig {
  async fn resolve(
    self,
    _: &ReadArgs,
  ) -> serror::Result<ProjectConfigValidation> {
    let catalog = load_catalog().await?;
    Ok(image::validate(
      &catalog,
      &ResolveParams {
        flavor: self.flavor.as_deref(),
        addons: &self.addons,
        tier: self.tier.as_deref(),
        // Validation never derives fqdns.
        slug: "",
      },
    ))
  }
}
