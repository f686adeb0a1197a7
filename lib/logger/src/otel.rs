use std::time::Duration;

use anyhow::Context;
use codeopen_client::entities::logger::LogConfig;
use opentelemetry::{KeyValue, global, trace::TracerProvider};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
  Resource,
  trace::{Sampler, Tracer},
};
use opentelemetry_semantic_conventions::resource::{
  SERVICE_NAMESPACE, SERVICE_VERSION,
};

const EXPORT_TIMEOUT: Duration = Duration::from_secs(3);

/// Tracer exporting to the configured otlp endpoint, tagged
/// with the CodeOpen service identity so spans from multiple
/// control planes stay distinguishable in one collector.
pub fn tracer(config: &LogConfig) -> anyhow::Result<Tracer> {
  let exporter = opentelemetry_otlp::SpanExporter::builder()
    .with_http()
    .with_endpoint(&config.otlp_endpoint)
    .with_timeout(EXPORT_TIMEOUT)
    .build()
    .context("failed to build otlp span exporter")?;

  let resource = Resource::builder()
    .with_service_name(
      config.opentelemetry_service_name.clone(),
    )
    .with_attribute(KeyValue::new(
      SERVICE_NAMESPACE,
      "codeopen",
    ))
    .with_attribute(KeyValue::new(
      SERVICE_VERSION,
      env!("CARGO_PKG_VERSION"),
    ))
    .build();

  let provider =
    opentelemetry_sdk::trace::TracerProviderBuilder::default()
      .with_resource(resource)
      .with_sampler(Sampler::AlwaysOn)
      .with_batch_exporter(exporter)
      .build();
  global::set_tracer_provider(provider.clone());

  Ok(
    provider
      .tracer(config.opentelemetry_service_name.clone()),
  )
}
