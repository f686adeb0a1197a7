use anyhow::{Context, anyhow};
use codeopen_client::entities::{
  config::DatabaseConfig,
  image::{ContainerAddon, ContainerFlavor, ResourceTier},
  project::Project,
  provider::LlmProvider,
  setting::Setting,
};
use mungos::{
  init::MongoBuilder,
  mongodb::{Collection, Database},
};

pub use mongo_indexed;
pub use mungos;

#[derive(Debug)]
pub struct Client {
  pub projects: Collection<Project>,
  pub providers: Collection<LlmProvider>,
  pub container_flavors: Collection<ContainerFlavor>,
  pub container_addons: Collection<ContainerAddon>,
  pub resource_tiers: Collection<ResourceTier>,
  pub settings: Collection<Setting>,
  //
  pub db: Database,
}

impl Client {
  pub async fn new(
    config: &DatabaseConfig,
  ) -> anyhow::Result<Client> {
    let db = init(config).await?;
    Self::from_database(db).await
  }

  pub async fn from_database(db: Database) -> anyhow::Result<Client> {
    let client = Client {
      projects: mongo_indexed::collection(&db, true).await?,
      providers: mongo_indexed::collection(&db, true).await?,
      container_flavors: mongo_indexed::collection(&db, true)
        .await?,
      container_addons: mongo_indexed::collection(&db, true)
        .await?,
      resource_tiers: mongo_indexed::collection(&db, true).await?,
      settings: mongo_indexed::collection(&db, true).await?,
      //
      db,
    };
    Ok(client)
  }
}

/// Unindexed database handle from the configured connection
/// info. A full `uri` wins when given, otherwise the connection
/// is built from `address`, with `username` + `password` only
/// when both are set.
pub async fn init(
  config: &DatabaseConfig,
) -> anyhow::Result<Database> {
  let mut builder =
    MongoBuilder::default().app_name(&config.app_name);

  if !config.uri.is_empty() {
    builder = builder.uri(&config.uri);
  } else if !config.address.is_empty() {
    builder = builder.address(&config.address);
    if !config.username.is_empty()
      && !config.password.is_empty()
    {
      builder = builder
        .username(&config.username)
        .password(&config.password);
    }
  } else {
    return Err(anyhow!(
      "no database connection configured: set CODEOPEN_DATABASE_URI, or CODEOPEN_DATABASE_ADDRESS plus username / password"
    ));
  }

  let client = builder
    .build()
    .await
    .context("failed to connect the database client")?;

  Ok(client.database(&config.db_name))
}
