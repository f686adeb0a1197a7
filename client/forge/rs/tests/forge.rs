use std::{
  sync::{Arc, Mutex},
  time::Duration,
};

use axum::{
  Json, Router,
  extract::{Path, State},
  http::{HeaderMap, StatusCode},
  routing::{get, post},
};
use forge_client::{
  CreateRepoBody, ForgeClient, ForgeError, MirrorRepoBody,
};
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct Recorded {
  auth_headers: Arc<Mutex<Vec<String>>>,
  bodies: Arc<Mutex<Vec<Value>>>,
}

impl Recorded {
  fn record_auth(&self, headers: &HeaderMap) {
    let auth = headers
      .get("authorization")
      .and_then(|h| h.to_str().ok())
      .unwrap_or_default()
      .to_string();
    self.auth_headers.lock().unwrap().push(auth);
  }
}

fn repo_json(id: i64, name: &str) -> Value {
  json!({
    "id": id,
    "name": name,
    "full_name": format!("codeopen/{name}"),
    "private": false,
    "clone_url": format!("http://forgejo:3000/codeopen/{name}.git"),
    "html_url": format!("http://forgejo:3000/codeopen/{name}"),
    "default_branch": "main",
    "owner": { "id": 1, "login": "codeopen" }
  })
}

async fn stub_forge() -> (ForgeClient, Recorded) {
  let recorded = Recorded::default();

  let app = Router::new()
    .route(
      "/api/v1/user",
      get(|State(rec): State<Recorded>, headers: HeaderMap| async move {
        rec.record_auth(&headers);
        Json(json!({ "id": 1, "login": "codeopen" }))
      }),
    )
    .route(
      "/api/v1/user/repos",
      post(
        |State(rec): State<Recorded>,
         headers: HeaderMap,
         Json(body): Json<Value>| async move {
          rec.record_auth(&headers);
          rec.bodies.lock().unwrap().push(body.clone());
          let name = body["name"].as_str().unwrap_or_default();
          match name {
            "taken" => (
              StatusCode::CONFLICT,
              Json(json!({ "message": "repository already exists" })),
            ),
            "throttled" => (
              StatusCode::TOO_MANY_REQUESTS,
              Json(json!({ "message": "slow down" })),
            ),
            _ => (StatusCode::CREATED, Json(repo_json(42, name))),
          }
        },
      ),
    )
    .route(
      "/api/v1/repos/migrate",
      post(
        |State(rec): State<Recorded>,
         Json(body): Json<Value>| async move {
          rec.bodies.lock().unwrap().push(body.clone());
          let name =
            body["repo_name"].as_str().unwrap_or_default();
          (StatusCode::CREATED, Json(repo_json(77, name)))
        },
      ),
    )
    .route(
      "/api/v1/repos/{owner}/{name}/contents/{path}",
      get(
        |Path((_owner, _name, path)): Path<(
          String,
          String,
          String,
        )>| async move {
          match path.as_str() {
            "src" => Json(json!([
              { "name": "main.rs", "path": "src/main.rs", "type": "file", "size": 120 },
              { "name": "api", "path": "src/api", "type": "dir" },
            ])),
            _ => Json(json!({
              "name": "README.md",
              "path": "README.md",
              "type": "file",
              "size": 64,
              "content": "IyBoZWxsbwo=",
            })),
          }
        },
      ),
    )
    .route(
      "/api/v1/repos/{owner}/{name}",
      get(
        |Path((_owner, name)): Path<(String, String)>| async move {
          match name.as_str() {
            "missing" => (
              StatusCode::NOT_FOUND,
              Json(json!({ "message": "not found" })),
            ),
            _ => (StatusCode::OK, Json(repo_json(42, &name))),
          }
        },
      )
      .delete(
        |Path((_owner, name)): Path<(String, String)>| async move {
          match name.as_str() {
            "missing" => StatusCode::NOT_FOUND,
            _ => StatusCode::NO_CONTENT,
          }
        },
      ),
    )
    .with_state(recorded.clone());

  let listener =
    tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let address = format!("http://{}", listener.local_addr().unwrap());
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });

  let client = ForgeClient::new(
    address,
    "test-forge-token",
    Duration::from_secs(2),
  );
  (client, recorded)
}

#[tokio::test]
async fn sends_token_auth_header_not_bearer() {
  let (client, recorded) = stub_forge().await;
  client.get_current_user().await.unwrap();
  let headers = recorded.auth_headers.lock().unwrap();
  assert_eq!(headers.as_slice(), ["token test-forge-token"]);
}

#[tokio::test]
async fn create_repo_round_trips() {
  let (client, recorded) = stub_forge().await;
  let repo = client
    .create_repo(&CreateRepoBody {
      name: String::from("hello-world"),
      description: String::from("a test"),
      private: false,
      auto_init: true,
      default_branch: String::from("main"),
    })
    .await
    .unwrap();
  assert_eq!(repo.id, 42);
  assert_eq!(repo.name, "hello-world");
  assert_eq!(repo.owner.login, "codeopen");

  let bodies = recorded.bodies.lock().unwrap();
  assert_eq!(bodies[0]["auto_init"], json!(true));
  assert_eq!(bodies[0]["default_branch"], json!("main"));
}

#[tokio::test]
async fn create_repo_name_collision_is_conflict() {
  let (client, _) = stub_forge().await;
  let err = client
    .create_repo(&CreateRepoBody {
      name: String::from("taken"),
      private: false,
      auto_init: true,
      default_branch: String::from("main"),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert!(matches!(err, ForgeError::Conflict { .. }));
}

#[tokio::test]
async fn rate_limit_surfaces_as_rate_limited() {
  let (client, _) = stub_forge().await;
  let err = client
    .create_repo(&CreateRepoBody {
      name: String::from("throttled"),
      private: false,
      auto_init: true,
      default_branch: String::from("main"),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert!(matches!(err, ForgeError::RateLimited { .. }));
}

#[tokio::test]
async fn mirror_repo_passes_clone_addr_and_mirror_false() {
  let (client, recorded) = stub_forge().await;
  let repo = client
    .mirror_repo(&MirrorRepoBody {
      clone_addr: String::from("https://github.com/acme/demo"),
      repo_name: String::from("demo"),
      description: String::new(),
      private: false,
      mirror: false,
    })
    .await
    .unwrap();
  assert_eq!(repo.id, 77);

  let bodies = recorded.bodies.lock().unwrap();
  assert_eq!(
    bodies[0]["clone_addr"],
    json!("https://github.com/acme/demo")
  );
  assert_eq!(bodies[0]["mirror"], json!(false));
  assert_eq!(bodies[0]["repo_name"], json!("demo"));
}

#[tokio::test]
async fn repo_exists_suppresses_not_found() {
  let (client, _) = stub_forge().await;
  assert!(
    client.repo_exists("codeopen", "hello-world").await.unwrap()
  );
  assert!(
    !client.repo_exists("codeopen", "missing").await.unwrap()
  );
}

#[tokio::test]
async fn list_contents_handles_files_and_directories() {
  use forge_client::ContentsResponse;

  let (client, _) = stub_forge().await;

  let file = client
    .list_contents("codeopen", "demo", "README.md", None)
    .await
    .unwrap();
  let ContentsResponse::File(entry) = file else {
    panic!("expected a single file entry");
  };
  assert_eq!(entry.kind, "file");
  assert_eq!(entry.content.as_deref(), Some("IyBoZWxsbwo="));

  let dir = client
    .list_contents("codeopen", "demo", "src", Some("main"))
    .await
    .unwrap();
  let ContentsResponse::Dir(entries) = dir else {
    panic!("expected a directory listing");
  };
  assert_eq!(entries.len(), 2);
  assert_eq!(entries[1].kind, "dir");
}

#[tokio::test]
async fn delete_repo_surfaces_not_found() {
  let (client, _) = stub_forge().await;
  client.delete_repo("codeopen", "hello-world").await.unwrap();
  let err = client
    .delete_repo("codeopen", "missing")
    .await
    .unwrap_err();
  assert!(matches!(err, ForgeError::NotFound { .. }));
}
