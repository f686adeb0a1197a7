use std::sync::OnceLock;

use anyhow::{Context, anyhow};
use codeopen_client::entities::{
  config::{CoreConfig, DatabaseConfig, Env},
  logger::LogConfig,
};

static CORE_CONFIG: OnceLock<CoreConfig> = OnceLock::new();

pub fn core_config() -> &'static CoreConfig {
  CORE_CONFIG
    .get()
    .expect("core_config accessed before initialized")
}

/// Must be called first in the startup sequence. Failure here
/// means the environment is unusable, the process exits with
/// code 2.
pub fn init_core_config() -> anyhow::Result<&'static CoreConfig> {
  let env: Env = envy::from_env()
    .context("failed to parse CodeOpen Core environment")?;
  let config = CoreConfig::default();

  // Recreating CoreConfig here makes sure all env overrides
  // are applied.
  let config = CoreConfig {
    host: env.codeopen_host.unwrap_or(config.host),
    port: env.codeopen_port.unwrap_or(config.port),
    bind_ip: env.codeopen_bind_ip.unwrap_or(config.bind_ip),
    forge_address: env
      .codeopen_forge_address
      .unwrap_or(config.forge_address),
    forge_public_address: env
      .codeopen_forge_public_address
      .unwrap_or(config.forge_public_address),
    forge_token: env
      .codeopen_forge_token
      .unwrap_or(config.forge_token),
    forge_owner: env
      .codeopen_forge_owner
      .unwrap_or(config.forge_owner),
    git_user_email: env
      .codeopen_git_user_email
      .unwrap_or(config.git_user_email),
    git_user_name: env
      .codeopen_git_user_name
      .unwrap_or(config.git_user_name),
    platform_address: env
      .codeopen_platform_address
      .unwrap_or(config.platform_address),
    platform_token: env
      .codeopen_platform_token
      .unwrap_or(config.platform_token),
    platform_project_uuid: env
      .codeopen_platform_project_uuid
      .unwrap_or(config.platform_project_uuid),
    platform_server_uuid: env
      .codeopen_platform_server_uuid
      .unwrap_or(config.platform_server_uuid),
    platform_environment_name: env
      .codeopen_platform_environment_name
      .unwrap_or(config.platform_environment_name),
    image_registry: env
      .codeopen_image_registry
      .unwrap_or(config.image_registry),
    image_owner: env
      .codeopen_image_owner
      .unwrap_or(config.image_owner),
    image_version: env
      .codeopen_image_version
      .unwrap_or(config.image_version),
    wildcard_domain: env
      .codeopen_wildcard_domain
      .unwrap_or(config.wildcard_domain),
    opencode_port: env
      .codeopen_opencode_port
      .unwrap_or(config.opencode_port),
    gateway_port: env
      .codeopen_gateway_port
      .unwrap_or(config.gateway_port),
    port_range_start: env
      .codeopen_port_range_start
      .unwrap_or(config.port_range_start),
    port_range_end: env
      .codeopen_port_range_end
      .unwrap_or(config.port_range_end),
    health_check_path: env
      .codeopen_health_check_path
      .unwrap_or(config.health_check_path),
    request_timeout_secs: env
      .codeopen_request_timeout_secs
      .unwrap_or(config.request_timeout_secs),
    database: DatabaseConfig {
      uri: env
        .codeopen_database_uri
        .unwrap_or(config.database.uri),
      address: env
        .codeopen_database_address
        .unwrap_or(config.database.address),
      username: env
        .codeopen_database_username
        .unwrap_or(config.database.username),
      password: env
        .codeopen_database_password
        .unwrap_or(config.database.password),
      app_name: env
        .codeopen_database_app_name
        .unwrap_or(config.database.app_name),
      db_name: env
        .codeopen_database_db_name
        .unwrap_or(config.database.db_name),
    },
    logging: LogConfig {
      level: env
        .codeopen_logging_level
        .unwrap_or(config.logging.level),
      stdio: env
        .codeopen_logging_stdio
        .unwrap_or(config.logging.stdio),
      pretty: env
        .codeopen_logging_pretty
        .unwrap_or(config.logging.pretty),
      otlp_endpoint: env
        .codeopen_logging_otlp_endpoint
        .unwrap_or(config.logging.otlp_endpoint),
      opentelemetry_service_name: env
        .codeopen_logging_opentelemetry_service_name
        .unwrap_or(config.logging.opentelemetry_service_name),
    },
    pretty_startup_config: env
      .codeopen_pretty_startup_config
      .unwrap_or(config.pretty_startup_config),
    ssl_enabled: env
      .codeopen_ssl_enabled
      .unwrap_or(config.ssl_enabled),
    ssl_key_file: env
      .codeopen_ssl_key_file
      .unwrap_or(config.ssl_key_file),
    ssl_cert_file: env
      .codeopen_ssl_cert_file
      .unwrap_or(config.ssl_cert_file),
  };

  let errors = config.validation_errors();
  if !errors.is_empty() {
    return Err(anyhow!(
      "invalid configuration: {}",
      errors.join(" | ")
    ));
  }

  CORE_CONFIG
    .set(config)
    .map_err(|_| anyhow!("core config initialized more than once"))?;

  Ok(core_config())
}
