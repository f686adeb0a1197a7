use anyhow::Context;
use codeopen_client::entities::logger::{LogConfig, StdioLogMode};
use tracing::level_filters::LevelFilter;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{
  Layer, Registry, layer::SubscriberExt,
  registry::LookupSpan, util::SubscriberInitExt,
};

mod otel;

/// One subscriber for the whole process: leveled stdio output
/// in the configured mode, plus otel span export whenever an
/// otlp endpoint is configured. Both layers are optional, a
/// `stdio: none` config without an endpoint logs nothing.
pub fn init(config: &LogConfig) -> anyhow::Result<()> {
  let level: tracing::Level = config.level.into();

  let otel = if config.otlp_endpoint.is_empty() {
    None
  } else {
    Some(OpenTelemetryLayer::new(otel::tracer(config)?))
  };

  Registry::default()
    .with(LevelFilter::from(level))
    .with(stdio_layer(config))
    .with(otel)
    .try_init()
    .context("failed to init logger")
}

fn stdio_layer<S>(
  config: &LogConfig,
) -> Option<Box<dyn Layer<S> + Send + Sync>>
where
  S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
  match (config.stdio, config.pretty) {
    (StdioLogMode::None, _) => None,
    (StdioLogMode::Json, _) => {
      Some(tracing_subscriber::fmt::layer().json().boxed())
    }
    (StdioLogMode::Standard, true) => Some(
      tracing_subscriber::fmt::layer()
        .pretty()
        .with_file(false)
        .with_line_number(false)
        .boxed(),
    ),
    (StdioLogMode::Standard, false) => Some(
      tracing_subscriber::fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .boxed(),
    ),
  }
}
