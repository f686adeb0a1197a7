use std::collections::HashMap;

use codeopen_client::entities::config::CoreConfig;

/// Inputs for one container's environment.
pub struct EnvInputs<'a> {
  pub project_name: &'a str,
  pub clone_url_public: &'a str,
  /// Credential vars from the vault, opaque here.
  pub credential_env: &'a HashMap<String, String>,
}

/// Base runtime vars merged with the vault's credential vars.
/// Base vars win key collisions, so credentials can never
/// clobber runtime configuration.
pub fn compose_env(
  config: &CoreConfig,
  inputs: EnvInputs,
) -> HashMap<String, String> {
  let mut env = inputs.credential_env.clone();
  let base = [
    (
      "OPENCODE_PORT",
      config.opencode_port.to_string(),
    ),
    ("OPENCODE_HOST", String::from("0.0.0.0")),
    (
      "FORGEJO_REPO_URL",
      inputs.clone_url_public.to_string(),
    ),
    ("FORGEJO_USER", config.forge_owner.clone()),
    ("FORGEJO_TOKEN", config.forge_token.clone()),
    ("GIT_USER_EMAIL", config.git_user_email.clone()),
    ("GIT_USER_NAME", config.git_user_name.clone()),
    ("PROJECT_NAME", inputs.project_name.to_string()),
  ];
  for (key, value) in base {
    env.insert(key.to_string(), value);
  }
  env
}

/// Converts the forge-internal clone url into the public https
/// form handed to containers. With a configured public base the
/// host is swapped wholesale; without one, an explicit port is
/// stripped off an https url.
pub fn public_clone_url(
  clone_url: &str,
  public_base: &str,
) -> String {
  if !public_base.is_empty() {
    let public_base = public_base.trim_end_matches('/');
    // Path beyond `scheme://host[:port]/`
    let path = clone_url
      .splitn(4, '/')
      .nth(3)
      .unwrap_or_default();
    return format!("{public_base}/{path}");
  }
  if let Some(rest) = clone_url.strip_prefix("https://")
    && let Some((host, path)) = rest.split_once('/')
    && let Some((hostname, _port)) = host.split_once(':')
  {
    return format!("https://{hostname}/{path}");
  }
  clone_url.to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config() -> CoreConfig {
    CoreConfig {
      forge_owner: String::from("codeopen"),
      forge_token: String::from("secret-token"),
      git_user_email: String::from("bot@example.com"),
      git_user_name: String::from("CodeOpen"),
      ..Default::default()
    }
  }

  #[test]
  fn base_vars_override_credential_vars() {
    let credential_env = [
      (
        String::from("OPENCODE_AUTH_JSON"),
        String::from("{\"x\":1}"),
      ),
      // A hostile / buggy provider trying to clobber runtime
      // config loses.
      (String::from("OPENCODE_PORT"), String::from("1")),
      (
        String::from("FORGEJO_TOKEN"),
        String::from("stolen"),
      ),
    ]
    .into_iter()
    .collect();

    let env = compose_env(
      &config(),
      EnvInputs {
        project_name: "Hello World",
        clone_url_public:
          "https://git.example.com/codeopen/hello-world.git",
        credential_env: &credential_env,
      },
    );

    assert_eq!(env["OPENCODE_PORT"], "4096");
    assert_eq!(env["FORGEJO_TOKEN"], "secret-token");
    assert_eq!(env["OPENCODE_AUTH_JSON"], "{\"x\":1}");
    assert_eq!(env["PROJECT_NAME"], "Hello World");
    assert_eq!(
      env["FORGEJO_REPO_URL"],
      "https://git.example.com/codeopen/hello-world.git"
    );
    assert_eq!(env["OPENCODE_HOST"], "0.0.0.0");
  }

  #[test]
  fn public_base_replaces_internal_host() {
    assert_eq!(
      public_clone_url(
        "http://forgejo:3000/codeopen/hello-world.git",
        "https://git.example.com"
      ),
      "https://git.example.com/codeopen/hello-world.git"
    );
  }

  #[test]
  fn explicit_port_is_stripped_without_public_base() {
    assert_eq!(
      public_clone_url(
        "https://git.example.com:3000/codeopen/demo.git",
        ""
      ),
      "https://git.example.com/codeopen/demo.git"
    );
  }

  #[test]
  fn clean_urls_pass_through() {
    assert_eq!(
      public_clone_url(
        "https://git.example.com/codeopen/demo.git",
        ""
      ),
      "https://git.example.com/codeopen/demo.git"
    );
  }
}
