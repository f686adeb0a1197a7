use std::{
  sync::{Arc, OnceLock},
  time::Duration,
};

use anyhow::Context;
use assistant_client::AssistantClient;
use dashmap::DashMap;
use forge_client::ForgeClient;
use platform_client::PlatformClient;
use tokio::sync::Mutex;

use crate::config::core_config;

static DB_CLIENT: OnceLock<database::Client> = OnceLock::new();

pub fn db_client() -> &'static database::Client {
  DB_CLIENT
    .get()
    .expect("db_client accessed before initialized")
}

/// Must be called in app startup sequence.
pub async fn init_db_client() -> anyhow::Result<()> {
  let client = database::Client::new(&core_config().database)
    .await
    .context("failed to initialize database client")?;
  DB_CLIENT
    .set(client)
    .map_err(|_| {
      anyhow::anyhow!("db_client initialized more than once")
    })?;
  Ok(())
}

fn request_timeout() -> Duration {
  Duration::from_secs(core_config().request_timeout_secs)
}

pub fn forge_client() -> &'static ForgeClient {
  static FORGE_CLIENT: OnceLock<ForgeClient> = OnceLock::new();
  FORGE_CLIENT.get_or_init(|| {
    let config = core_config();
    ForgeClient::new(
      &config.forge_address,
      &config.forge_token,
      request_timeout(),
    )
  })
}

pub fn platform_client() -> &'static PlatformClient {
  static PLATFORM_CLIENT: OnceLock<PlatformClient> =
    OnceLock::new();
  PLATFORM_CLIENT.get_or_init(|| {
    let config = core_config();
    PlatformClient::new(
      &config.platform_address,
      &config.platform_token,
      request_timeout(),
    )
  })
}

/// project id -> serialization lock. All orchestrator operations
/// on the same project run mutually exclusively through these.
pub fn project_locks()
-> &'static DashMap<String, Arc<Mutex<()>>> {
  static PROJECT_LOCKS: OnceLock<
    DashMap<String, Arc<Mutex<()>>>,
  > = OnceLock::new();
  PROJECT_LOCKS.get_or_init(Default::default)
}

/// project id -> prepared assistant client. On the hot request
/// path, reads stay lock-free through the shard map.
pub fn assistant_clients()
-> &'static DashMap<String, AssistantClient> {
  static ASSISTANT_CLIENTS: OnceLock<
    DashMap<String, AssistantClient>,
  > = OnceLock::new();
  ASSISTANT_CLIENTS.get_or_init(Default::default)
}
