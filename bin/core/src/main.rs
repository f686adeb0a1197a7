#[macro_use]
extern crate tracing;

use std::{net::SocketAddr, str::FromStr};

use anyhow::Context;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tower_http::cors::{Any, CorsLayer};

use crate::config::core_config;

mod api;
mod config;
mod errors;
mod image;
mod orchestrator;
mod proxy;
mod startup;
mod state;
mod store;
mod vault;

async fn app() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();
  let config = match config::init_core_config() {
    Ok(config) => config,
    Err(e) => {
      eprintln!("{e:#}");
      // Exit code contract: 2 means the configuration is
      // unusable.
      std::process::exit(2);
    }
  };
  logger::init(&config.logging)?;
  if let Err(e) =
    rustls::crypto::aws_lc_rs::default_provider().install_default()
  {
    error!("Failed to install default crypto provider | {e:?}");
    std::process::exit(1);
  };

  info!(
    "CodeOpen Core version: v{}",
    env!("CARGO_PKG_VERSION")
  );

  if config.pretty_startup_config {
    info!("{:#?}", config.sanitized());
  } else {
    info!("{:?}", config.sanitized());
  }

  if let Err(e) = state::init_db_client().await {
    error!("{e:#}");
    std::process::exit(1);
  }

  if let Err(e) = startup::on_startup().await {
    match e {
      startup::StartupFailure::Database(msg) => {
        error!("{msg}");
        std::process::exit(1);
      }
      startup::StartupFailure::UpstreamUnreachable(msg) => {
        error!("{msg}");
        std::process::exit(3);
      }
      startup::StartupFailure::MigrationRequired(msg) => {
        error!("{msg}");
        std::process::exit(4);
      }
    }
  }

  let app = Router::new()
    .nest("/read", api::read::router())
    .nest("/write", api::write::router())
    .nest("/execute", api::execute::router())
    .nest("/assistant", api::assistant::router())
    .layer(
      CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any),
    )
    .into_make_service();

  let addr =
    format!("{}:{}", core_config().bind_ip, core_config().port);
  let socket_addr = SocketAddr::from_str(&addr)
    .context("failed to parse listen address")?;

  if config.ssl_enabled {
    info!("🔒 Core SSL Enabled");
    info!("CodeOpen Core starting on https://{socket_addr}");
    let ssl_config = RustlsConfig::from_pem_file(
      &config.ssl_cert_file,
      &config.ssl_key_file,
    )
    .await
    .context("Invalid ssl cert / key")?;
    axum_server::bind_rustls(socket_addr, ssl_config)
      .serve(app)
      .await
      .context("failed to start https server")
  } else {
    info!("🔓 Core SSL Disabled");
    info!("CodeOpen Core starting on http://{socket_addr}");
    axum_server::bind(socket_addr)
      .serve(app)
      .await
      .context("failed to start http server")
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let mut term_signal = tokio::signal::unix::signal(
    tokio::signal::unix::SignalKind::terminate(),
  )?;
  tokio::select! {
    res = tokio::spawn(app()) => res?,
    _ = term_signal.recv() => Ok(()),
  }
}
