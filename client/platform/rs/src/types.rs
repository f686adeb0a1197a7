use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformServer {
  pub uuid: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub ip: String,
  #[serde(default)]
  pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformProject {
  pub uuid: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub description: String,
}

/// Application details. `fqdn` is the definitive source of the
/// public url once the platform assigns it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct App {
  pub uuid: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub fqdn: Option<String>,
  #[serde(default)]
  pub status: String,
  #[serde(default)]
  pub ports_exposes: String,
}

/// Inputs for creating a dockerfile-built application.
/// `dockerfile` is the raw text, the client base-64 encodes it
/// on the wire exactly once.
#[derive(Debug, Clone, Default)]
pub struct CreateAppFromDockerfile {
  pub name: String,
  pub description: String,
  pub dockerfile: String,
  /// Comma separated container ports, eg `4096,4097`.
  pub ports_exposes: String,
  /// Comma separated `https://{fqdn}:{port}` pairs.
  pub domains: Option<String>,
  pub instant_deploy: bool,
  pub health_check: HealthCheck,
}

/// Inputs for creating an application from a prebuilt image.
#[derive(Debug, Clone, Default)]
pub struct CreateAppFromDockerImage {
  pub name: String,
  pub description: String,
  pub docker_registry_image_name: String,
  pub docker_registry_image_tag: String,
  pub ports_exposes: String,
  pub domains: Option<String>,
  pub instant_deploy: bool,
  pub health_check: HealthCheck,
}

#[derive(Debug, Clone, Default)]
pub struct HealthCheck {
  pub enabled: bool,
  pub path: String,
  pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedApp {
  pub uuid: String,
}

/// Partial application settings re-asserted after create,
/// since the create endpoint does not reliably accept all
/// fields. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateApp {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  /// Raw dockerfile text, encoded by the client on the wire.
  #[serde(skip)]
  pub dockerfile: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub ports_exposes: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub domains: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub health_check_enabled: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub health_check_path: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub health_check_port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeployResponse {
  #[serde(default)]
  pub deployments: Vec<Deployment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Deployment {
  #[serde(default)]
  pub message: String,
  #[serde(default)]
  pub deployment_uuid: String,
}

/// One stored environment variable. The platform auto-creates a
/// preview twin of every variable it stores, callers filter on
/// `is_preview` when they only want production values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvVar {
  pub uuid: String,
  pub key: String,
  #[serde(default)]
  pub value: String,
  #[serde(default)]
  pub is_preview: bool,
}
