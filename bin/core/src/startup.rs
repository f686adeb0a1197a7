use codeopen_client::entities::{
  image::{ContainerAddon, ContainerFlavor, ResourceTier},
  setting::Setting,
};
use database::mungos::mongodb::bson::doc;

use crate::{
  config::core_config,
  state::{db_client, forge_client, platform_client},
};

/// Bumped whenever the persisted layout changes incompatibly.
pub const SCHEMA_VERSION: &str = "1";
const SCHEMA_VERSION_KEY: &str = "schema_version";

pub enum StartupFailure {
  /// Exit code 1.
  Database(String),
  /// Exit code 3.
  UpstreamUnreachable(String),
  /// Exit code 4.
  MigrationRequired(String),
}

pub async fn on_startup() -> Result<(), StartupFailure> {
  ensure_schema().await?;
  probe_upstreams().await?;
  seed_defaults().await;
  Ok(())
}

/// Fresh databases are stamped with the current schema
/// version. A database with data but no stamp, or with a
/// different stamp, needs migration before this build may
/// touch it.
async fn ensure_schema() -> Result<(), StartupFailure> {
  let db = db_client();
  let stamp = db
    .settings
    .find_one(doc! { "key": SCHEMA_VERSION_KEY })
    .await
    .map_err(|e| {
      StartupFailure::Database(format!(
        "failed to read the schema stamp | {e}"
      ))
    })?;

  match stamp {
    Some(stamp) if stamp.value == SCHEMA_VERSION => Ok(()),
    Some(stamp) => Err(StartupFailure::MigrationRequired(
      format!(
        "database schema is '{}', this build needs '{SCHEMA_VERSION}'",
        stamp.value
      ),
    )),
    None => {
      let projects = db
        .projects
        .estimated_document_count()
        .await
        .map_err(|e| {
          StartupFailure::Database(format!(
            "failed to count projects | {e}"
          ))
        })?;
      if projects > 0 {
        return Err(StartupFailure::MigrationRequired(
          String::from(
            "database holds projects but carries no schema stamp",
          ),
        ));
      }
      db.settings
        .insert_one(Setting {
          id: String::new(),
          key: SCHEMA_VERSION_KEY.to_string(),
          value: SCHEMA_VERSION.to_string(),
        })
        .await
        .map_err(|e| {
          StartupFailure::Database(format!(
            "failed to stamp the schema version | {e}"
          ))
        })?;
      info!("stamped fresh database with schema v{SCHEMA_VERSION}");
      Ok(())
    }
  }
}

/// Both remote systems must answer before serving, and the
/// configured target server must actually exist on the
/// platform.
async fn probe_upstreams() -> Result<(), StartupFailure> {
  let config = core_config();

  let servers =
    platform_client().list_servers().await.map_err(|e| {
      StartupFailure::UpstreamUnreachable(format!(
        "platform is not answering | {e}"
      ))
    })?;
  if !servers
    .iter()
    .any(|s| s.uuid == config.platform_server_uuid)
  {
    return Err(StartupFailure::UpstreamUnreachable(format!(
      "platform has no server '{}'",
      config.platform_server_uuid
    )));
  }

  let user =
    forge_client().get_current_user().await.map_err(|e| {
      StartupFailure::UpstreamUnreachable(format!(
        "forge is not answering | {e}"
      ))
    })?;
  info!(
    "upstreams reachable | forge user '{}' | {} platform server/s",
    user.login,
    servers.len()
  );

  Ok(())
}

/// First start against an empty database seeds the stock
/// flavor, addons, and tier, so projects can be created without
/// manual collection edits. Any non-empty collection is left
/// alone.
async fn seed_defaults() {
  let db = db_client();

  match db.container_flavors.estimated_document_count().await {
    Ok(0) => {
      let flavor = ContainerFlavor {
        flavor_id: String::from("base"),
        description: String::from(
          "Default assistant image flavor",
        ),
        is_default: true,
        ..Default::default()
      };
      match db.container_flavors.insert_one(&flavor).await {
        Ok(_) => info!("seeded default container flavor 'base'"),
        Err(e) => {
          warn!("failed to seed container flavors | {e}")
        }
      }
    }
    Ok(_) => {}
    Err(e) => warn!("failed to count container flavors | {e}"),
  }

  match db.container_addons.estimated_document_count().await {
    Ok(0) => {
      let addons = [
        ContainerAddon {
          addon_id: String::from("code"),
          description: String::from("Browser code editor"),
          compatible_flavors: vec![String::from("base")],
          extra_ports: vec![8443],
          fqdn_prefix: String::from("code"),
          sort_order: 1,
          ..Default::default()
        },
        ContainerAddon {
          addon_id: String::from("vnc"),
          description: String::from("Remote desktop"),
          compatible_flavors: vec![String::from("base")],
          extra_ports: vec![5901],
          fqdn_prefix: String::from("vnc"),
          sort_order: 2,
          ..Default::default()
        },
      ];
      match db.container_addons.insert_many(&addons).await {
        Ok(_) => info!("seeded default container addons"),
        Err(e) => {
          warn!("failed to seed container addons | {e}")
        }
      }
    }
    Ok(_) => {}
    Err(e) => warn!("failed to count container addons | {e}"),
  }

  match db.resource_tiers.estimated_document_count().await {
    Ok(0) => {
      let tier = ResourceTier {
        tier_id: String::from("standard"),
        cpu_millis: 2000,
        memory_mb: 4096,
        is_default: true,
        ..Default::default()
      };
      match db.resource_tiers.insert_one(&tier).await {
        Ok(_) => info!("seeded default resource tier 'standard'"),
        Err(e) => warn!("failed to seed resource tiers | {e}"),
      }
    }
    Ok(_) => {}
    Err(e) => warn!("failed to count resource tiers | {e}"),
  }
}
