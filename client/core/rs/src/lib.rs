//! # CodeOpen client
//!
//! Typed client for the CodeOpen control plane api.
//!
//! ```ignore
//! let client = CodeopenClient::new("https://codeopen.example.com");
//! let project = client
//!   .write(CreateProject {
//!     name: String::from("Hello World"),
//!     ..Default::default()
//!   })
//!   .await?;
//! ```

use anyhow::{Context, anyhow};
use resolver_api::HasResponse;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use serror::Serror;

use crate::api::{
  assistant::CodeopenAssistantRequest,
  execute::CodeopenExecuteRequest, read::CodeopenReadRequest,
  write::CodeopenWriteRequest,
};

pub mod api;
pub mod entities;

#[derive(Clone)]
pub struct CodeopenClient {
  address: String,
  reqwest: reqwest::Client,
}

impl CodeopenClient {
  pub fn new(address: impl Into<String>) -> CodeopenClient {
    CodeopenClient {
      address: address.into().trim_end_matches('/').to_string(),
      reqwest: Default::default(),
    }
  }

  pub async fn read<T>(&self, request: T) -> anyhow::Result<T::Response>
  where
    T: CodeopenReadRequest + Serialize,
    T::Response: DeserializeOwned,
  {
    self.resolve_request("/read", request).await
  }

  pub async fn write<T>(
    &self,
    request: T,
  ) -> anyhow::Result<T::Response>
  where
    T: CodeopenWriteRequest + Serialize,
    T::Response: DeserializeOwned,
  {
    self.resolve_request("/write", request).await
  }

  pub async fn execute<T>(
    &self,
    request: T,
  ) -> anyhow::Result<T::Response>
  where
    T: CodeopenExecuteRequest + Serialize,
    T::Response: DeserializeOwned,
  {
    self.resolve_request("/execute", request).await
  }

  pub async fn assistant<T>(
    &self,
    request: T,
  ) -> anyhow::Result<T::Response>
  where
    T: CodeopenAssistantRequest + Serialize,
    T::Response: DeserializeOwned,
  {
    self.resolve_request("/assistant", request).await
  }

  async fn resolve_request<T, Response>(
    &self,
    path: &str,
    request: T,
  ) -> anyhow::Result<Response>
  where
    T: HasResponse + Serialize,
    Response: DeserializeOwned,
  {
    let res = self
      .reqwest
      .post(format!("{}{path}", self.address))
      .json(&json!({
        "type": T::req_type(),
        "params": request,
      }))
      .send()
      .await
      .with_context(|| {
        format!("failed to reach core api at {}", self.address)
      })?;

    let status = res.status();

    if status.is_success() {
      res
        .json()
        .await
        .context("failed to parse response body")
    } else {
      let text = res
        .text()
        .await
        .context("failed to read error response body")?;
      let Serror { error, trace } =
        serde_json::from_str(&text).unwrap_or(Serror {
          error: text,
          trace: Vec::new(),
        });
      let trace = if trace.is_empty() {
        String::new()
      } else {
        format!(" | trace: {}", trace.join(" | "))
      };
      Err(anyhow!("{status} | {error}{trace}"))
    }
  }
}
