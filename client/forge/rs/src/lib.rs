//! Thin typed client over the forge (Forgejo compatible) REST
//! api. One remote call per method, no retries. Retry policy
//! belongs to the orchestrator, which keeps this client testable
//! against plain http fixtures.

use std::time::Duration;

use serde::de::DeserializeOwned;

mod error;
mod types;

pub use error::ForgeError;
pub use types::*;

#[derive(Clone)]
pub struct ForgeClient {
  address: String,
  token: String,
  reqwest: reqwest::Client,
}

impl ForgeClient {
  /// `address` is the base url of the forge,
  /// eg `https://git.example.com`.
  pub fn new(
    address: impl Into<String>,
    token: impl Into<String>,
    timeout: Duration,
  ) -> ForgeClient {
    ForgeClient {
      address: address.into().trim_end_matches('/').to_string(),
      token: token.into(),
      reqwest: reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("failed to build forge http client"),
    }
  }

  pub async fn get_current_user(
    &self,
  ) -> Result<ForgeUser, ForgeError> {
    let req =
      self.reqwest.get(format!("{}/api/v1/user", self.address));
    self.resolve(req).await
  }

  /// Not idempotent. Name collisions surface as
  /// [ForgeError::Conflict], which the orchestrator uses to drive
  /// slug re-suffixing.
  pub async fn create_repo(
    &self,
    body: &CreateRepoBody,
  ) -> Result<ForgeRepo, ForgeError> {
    let req = self
      .reqwest
      .post(format!("{}/api/v1/user/repos", self.address))
      .json(body);
    self.resolve(req).await
  }

  /// Creates the repo by cloning `clone_from_url` once.
  /// `mirror` stays false: the result is a plain repo, not a
  /// continuously syncing mirror.
  pub async fn mirror_repo(
    &self,
    body: &MirrorRepoBody,
  ) -> Result<ForgeRepo, ForgeError> {
    let req = self
      .reqwest
      .post(format!("{}/api/v1/repos/migrate", self.address))
      .json(body);
    self.resolve(req).await
  }

  pub async fn get_repo(
    &self,
    owner: &str,
    name: &str,
  ) -> Result<ForgeRepo, ForgeError> {
    let req = self.reqwest.get(format!(
      "{}/api/v1/repos/{owner}/{name}",
      self.address
    ));
    self.resolve(req).await
  }

  /// [Self::get_repo] with NotFound suppressed.
  pub async fn repo_exists(
    &self,
    owner: &str,
    name: &str,
  ) -> Result<bool, ForgeError> {
    match self.get_repo(owner, name).await {
      Ok(_) => Ok(true),
      Err(ForgeError::NotFound { .. }) => Ok(false),
      Err(e) => Err(e),
    }
  }

  /// Surfaces NotFound faithfully. Callers treating a missing
  /// repo as success suppress it themselves.
  pub async fn delete_repo(
    &self,
    owner: &str,
    name: &str,
  ) -> Result<(), ForgeError> {
    let req = self.reqwest.delete(format!(
      "{}/api/v1/repos/{owner}/{name}",
      self.address
    ));
    let res = self.send(req).await?;
    Self::check_status(res).await?;
    Ok(())
  }

  /// `path` may point at a file (single entry) or a directory
  /// (list of entries).
  pub async fn list_contents(
    &self,
    owner: &str,
    name: &str,
    path: &str,
    git_ref: Option<&str>,
  ) -> Result<ContentsResponse, ForgeError> {
    let mut req = self.reqwest.get(format!(
      "{}/api/v1/repos/{owner}/{name}/contents/{path}",
      self.address
    ));
    if let Some(git_ref) = git_ref {
      req = req.query(&[("ref", git_ref)]);
    }
    self.resolve(req).await
  }

  async fn resolve<T: DeserializeOwned>(
    &self,
    req: reqwest::RequestBuilder,
  ) -> Result<T, ForgeError> {
    let res = self.send(req).await?;
    let res = Self::check_status(res).await?;
    let text = res.text().await.map_err(|e| {
      ForgeError::Protocol {
        message: format!("failed to read response body | {e}"),
      }
    })?;
    serde_json::from_str(&text).map_err(|e| {
      ForgeError::Protocol {
        message: format!(
          "failed to parse response body | {e} | body: {text}"
        ),
      }
    })
  }

  async fn send(
    &self,
    req: reqwest::RequestBuilder,
  ) -> Result<reqwest::Response, ForgeError> {
    req
      // The forge takes `token`, not `Bearer`.
      .header("Authorization", format!("token {}", self.token))
      .send()
      .await
      .map_err(|e| ForgeError::Transport {
        message: format!("{e:?}"),
      })
  }

  async fn check_status(
    res: reqwest::Response,
  ) -> Result<reqwest::Response, ForgeError> {
    let status = res.status();
    if status.is_success() {
      return Ok(res);
    }
    let retry_after = error::parse_retry_after(res.headers());
    let message = res.text().await.unwrap_or_default();
    Err(match status.as_u16() {
      401 | 403 => ForgeError::Auth { message },
      404 => ForgeError::NotFound { message },
      409 => ForgeError::Conflict { message },
      429 => ForgeError::RateLimited { retry_after },
      _ => ForgeError::Upstream {
        status: status.as_u16(),
        message,
      },
    })
  }
}
