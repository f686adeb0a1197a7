//! Credential vault. The only component that reads
//! `credential_material`. Hands the orchestrator the exact env
//! vars the assistant container needs, never the secrets
//! themselves in any other form, and never logs values.

use anyhow::Context;
use codeopen_client::entities::provider::LlmProvider;
use database::mungos::{find::find_collect, mongodb::bson::doc};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::{errors, state::db_client};

/// The assistant reads its provider credentials from this
/// variable at boot.
pub const AUTH_JSON_ENV: &str = "OPENCODE_AUTH_JSON";
/// Non-secret model hint.
pub const MODEL_ENV: &str = "OPENCODE_MODEL";

pub const DEFAULT_PROVIDER_SETTING: &str = "default_provider_id";

/// Env vars for one provider, or the union of all configured
/// providers when `provider_id` is None (credential broadcast).
/// No providers configured is an empty map, not an error.
pub async fn get_env_vars(
  provider_id: Option<&str>,
) -> serror::Result<HashMap<String, String>> {
  let providers =
    find_collect(&db_client().providers, doc! {}, None)
      .await
      .context("failed to list providers")?;

  let selected = match provider_id {
    Some(id) => {
      let provider = providers
        .into_iter()
        .find(|p| p.provider_id == id)
        .ok_or_else(|| {
          errors::not_found(format!(
            "no llm provider matching '{id}'"
          ))
        })?;
      vec![provider]
    }
    None => providers,
  };

  if selected.is_empty() {
    warn!(
      "no llm providers configured, container starts without credentials"
    );
  }

  Ok(compose_env(&selected))
}

pub async fn get_setting(
  key: &str,
) -> anyhow::Result<Option<String>> {
  let setting = db_client()
    .settings
    .find_one(doc! { "key": key })
    .await
    .context("failed to query settings")?;
  Ok(setting.map(|s| s.value))
}

/// The configured default provider: the `default_provider_id`
/// setting when present, else the provider flagged
/// `is_default`.
pub async fn default_provider_id()
-> anyhow::Result<Option<String>> {
  if let Some(id) =
    get_setting(DEFAULT_PROVIDER_SETTING).await?
    && !id.is_empty()
  {
    return Ok(Some(id));
  }
  let providers =
    find_collect(&db_client().providers, doc! {}, None)
      .await
      .context("failed to list providers")?;
  Ok(
    providers
      .into_iter()
      .find(|p| p.is_default)
      .map(|p| p.provider_id),
  )
}

/// Builds the auth json the assistant expects: one object keyed
/// by provider family, each value the provider's opaque
/// credential blob. Providers with unparseable material are
/// skipped with a warning naming only the provider id.
fn compose_env(
  providers: &[LlmProvider],
) -> HashMap<String, String> {
  let mut env = HashMap::new();
  let mut auth = Map::new();

  for provider in providers {
    if provider.credential_material.is_empty() {
      warn!(
        "llm provider '{}' has no credential material",
        provider.provider_id
      );
      continue;
    }
    let material = match serde_json::from_str::<Value>(
      &provider.credential_material,
    ) {
      Ok(material) => material,
      Err(_) => {
        // Never echo the material itself.
        warn!(
          "llm provider '{}' credential material is not valid json, skipping",
          provider.provider_id
        );
        continue;
      }
    };
    let key = if provider.kind.is_empty() {
      provider.provider_id.clone()
    } else {
      provider.kind.clone()
    };
    auth.insert(key, material);
  }

  if !auth.is_empty() {
    env.insert(
      AUTH_JSON_ENV.to_string(),
      Value::Object(auth).to_string(),
    );
  }

  // Model hint: a named provider's default model, or the
  // default-flagged provider's in a broadcast.
  let model = match providers {
    [single] => Some(single),
    many => many.iter().find(|p| p.is_default),
  }
  .map(|p| p.default_model.clone())
  .unwrap_or_default();
  if !model.is_empty() {
    env.insert(MODEL_ENV.to_string(), model);
  }

  env
}

#[cfg(test)]
mod tests {
  use super::*;

  fn provider(
    id: &str,
    kind: &str,
    material: &str,
    is_default: bool,
  ) -> LlmProvider {
    LlmProvider {
      provider_id: id.to_string(),
      kind: kind.to_string(),
      credential_material: material.to_string(),
      default_model: format!("{id}-model"),
      is_default,
      ..Default::default()
    }
  }

  #[test]
  fn single_provider_env() {
    let providers = [provider(
      "anthropic",
      "anthropic",
      r#"{"type":"api","key":"sk-test"}"#,
      true,
    )];
    let env = compose_env(&providers);
    let auth: Value =
      serde_json::from_str(&env[AUTH_JSON_ENV]).unwrap();
    assert_eq!(auth["anthropic"]["key"], "sk-test");
    assert_eq!(env[MODEL_ENV], "anthropic-model");
  }

  #[test]
  fn broadcast_merges_all_providers() {
    let providers = [
      provider("anthropic", "anthropic", r#"{"key":"a"}"#, false),
      provider("router", "openrouter", r#"{"key":"b"}"#, true),
    ];
    let env = compose_env(&providers);
    let auth: Value =
      serde_json::from_str(&env[AUTH_JSON_ENV]).unwrap();
    assert_eq!(auth["anthropic"]["key"], "a");
    assert_eq!(auth["openrouter"]["key"], "b");
    // default provider wins the model hint
    assert_eq!(env[MODEL_ENV], "router-model");
  }

  #[test]
  fn no_providers_is_empty_map() {
    assert!(compose_env(&[]).is_empty());
  }

  #[test]
  fn unparseable_material_is_skipped() {
    let providers = [
      provider("bad", "bad", "not json", false),
      provider("good", "good", r#"{"key":"x"}"#, false),
    ];
    let env = compose_env(&providers);
    let auth: Value =
      serde_json::from_str(&env[AUTH_JSON_ENV]).unwrap();
    assert!(auth.get("bad").is_none());
    assert_eq!(auth["good"]["key"], "x");
  }
}
