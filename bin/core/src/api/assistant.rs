use std::time::Instant;

use axum::{
  Router,
  extract::Path,
  response::sse::{Event, KeepAlive, Sse},
  routing::{get, post},
};
use codeopen_client::{
  api::assistant::*, entities::JsonValue,
};
use derive_variants::{EnumVariants, ExtractVariant};
use futures::{Stream, StreamExt};
use resolver_api::Resolve;
use response::Response;
use serde::{Deserialize, Serialize};
use serde_json::json;
use serror::Json;
use typeshare::typeshare;
use uuid::Uuid;

use crate::{errors, proxy, store};

use super::Variant;

pub struct AssistantArgs;

#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EnumVariants,
)]
#[variant_derive(Debug)]
#[args(AssistantArgs)]
#[response(Response)]
#[error(serror::Error)]
#[serde(tag = "type", content = "params")]
pub enum AssistantRequest {
  ListSessions(ListSessions),
  CreateSession(CreateSession),
  ListMessages(ListMessages),
  SendMessage(SendMessage),
  ReadProjectFile(ReadProjectFile),
  FindInProject(FindInProject),
  GetAppInfo(GetAppInfo),
  GetEventStreamUrl(GetEventStreamUrl),
}

pub fn router() -> Router {
  Router::new()
    .route("/", post(handler))
    .route("/{variant}", post(variant_handler))
    .route("/events/{project}", get(events_handler))
}

async fn variant_handler(
  Path(Variant { variant }): Path<Variant>,
  Json(params): Json<serde_json::Value>,
) -> serror::Result<axum::response::Response> {
  let req: AssistantRequest = serde_json::from_value(json!({
    "type": variant,
    "params": params,
  }))?;
  handler(Json(req)).await
}

async fn handler(
  Json(request): Json<AssistantRequest>,
) -> serror::Result<axum::response::Response> {
  let req_id = Uuid::new_v4();
  let timer = Instant::now();
  debug!(
    "/assistant request {req_id} | {:?}",
    request.extract_variant()
  );

  let res = request.resolve(&AssistantArgs).await;

  if let Err(e) = &res {
    warn!("/assistant request {req_id} error: {:#}", e.error);
  }

  let elapsed = timer.elapsed();
  debug!(
    "/assistant request {req_id} | resolve time: {elapsed:?}"
  );

  res.map(|res| res.0)
}

/// The live event bridge: re-emits the downstream assistant's
/// server-sent events to the caller. Ends cleanly when either
/// side goes away; a caller disconnect drops the stream and
/// with it the downstream connection.
async fn events_handler(
  Path(project): Path<String>,
) -> serror::Result<
  Sse<impl Stream<Item = Result<Event, axum::Error>>>,
> {
  let project = store::get_project(&project).await?;
  proxy::ensure_running(&project)?;
  let client = proxy::assistant_client(&project).await?;
  let events = client
    .subscribe_events()
    .await
    .map_err(errors::assistant_error)?;

  let stream = events.map(|item| match item {
    Ok(event) => Event::default()
      .json_data(&event)
      .map_err(axum::Error::new),
    Err(e) => Err(axum::Error::new(e)),
  });

  Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Loads the project and its prepared client, enforcing the
/// running precondition.
async fn client_for(
  project: &str,
) -> serror::Result<assistant_client::AssistantClient> {
  let project = store::get_project(project).await?;
  proxy::ensure_running(&project)?;
  proxy::assistant_client(&project).await
}

impl Resolve<AssistantArgs> for ListSessions {
  async fn resolve(
    self,
    _: &AssistantArgs,
  ) -> serror::Result<JsonValue> {
    client_for(&self.project)
      .await?
      .list_sessions()
      .await
      .map_err(errors::assistant_error)
  }
}

impl Resolve<AssistantArgs> for CreateSession {
  async fn resolve(
    self,
    _: &AssistantArgs,
  ) -> serror::Result<JsonValue> {
    client_for(&self.project)
      .await?
      .create_session(&self.title)
      .await
      .map_err(errors::assistant_error)
  }
}

impl Resolve<AssistantArgs> for ListMessages {
  async fn resolve(
    self,
    _: &AssistantArgs,
  ) -> serror::Result<JsonValue> {
    client_for(&self.project)
      .await?
      .list_messages(&self.session)
      .await
      .map_err(errors::assistant_error)
  }
}

impl Resolve<AssistantArgs> for SendMessage {
  async fn resolve(
    self,
    _: &AssistantArgs,
  ) -> serror::Result<JsonValue> {
    client_for(&self.project)
      .await?
      .send_message(&self.session, &self.parts)
      .await
      .map_err(errors::assistant_error)
  }
}

impl Resolve<AssistantArgs> for ReadProjectFile {
  async fn resolve(
    self,
    _: &AssistantArgs,
  ) -> serror::Result<JsonValue> {
    client_for(&self.project)
      .await?
      .read_file(&self.path)
      .await
      .map_err(errors::assistant_error)
  }
}

impl Resolve<AssistantArgs> for FindInProject {
  async fn resolve(
    self,
    _: &AssistantArgs,
  ) -> serror::Result<JsonValue> {
    client_for(&self.project)
      .await?
      .find_in_files(&self.pattern)
      .await
      .map_err(errors::assistant_error)
  }
}

impl Resolve<AssistantArgs> for GetAppInfo {
  async fn resolve(
    self,
    _: &AssistantArgs,
  ) -> serror::Result<JsonValue> {
    client_for(&self.project)
      .await?
      .get_app_info()
      .await
      .map_err(errors::assistant_error)
  }
}

impl Resolve<AssistantArgs> for GetEventStreamUrl {
  async fn resolve(
    self,
    _: &AssistantArgs,
  ) -> serror::Result<GetEventStreamUrlResponse> {
    // The only proxied operation without the running
    // precondition: handing out the url is valid in any state.
    let project = store::get_project(&self.project).await?;
    let base_url = proxy::resolve_base_url(&project).await?;
    Ok(GetEventStreamUrlResponse {
      url: format!("{base_url}/event"),
    })
  }
}
