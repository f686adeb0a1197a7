use std::{
  sync::{Arc, Mutex},
  time::Duration,
};

use axum::{
  Json, Router,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  routing::{get, patch, post},
};
use platform_client::{
  CreateAppFromDockerfile, HealthCheck, PlatformClient,
  PlatformError, UpdateApp,
};
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct Recorded {
  auth_headers: Arc<Mutex<Vec<String>>>,
  bodies: Arc<Mutex<Vec<Value>>>,
  lifecycle_calls: Arc<Mutex<Vec<String>>>,
}

async fn stub_platform() -> (PlatformClient, Recorded) {
  let recorded = Recorded::default();

  let app = Router::new()
    .route(
      "/api/v1/servers",
      get(|State(rec): State<Recorded>, headers: HeaderMap| async move {
        let auth = headers
          .get("authorization")
          .and_then(|h| h.to_str().ok())
          .unwrap_or_default()
          .to_string();
        rec.auth_headers.lock().unwrap().push(auth);
        Json(json!([{ "uuid": "srv-1", "name": "main" }]))
      }),
    )
    .route(
      "/api/v1/projects",
      get(|| async {
        Json(json!([{ "uuid": "proj-1", "name": "codeopen" }]))
      }),
    )
    .route(
      "/api/v1/applications/dockerimage",
      post(
        |State(rec): State<Recorded>,
         Json(body): Json<Value>| async move {
          rec.bodies.lock().unwrap().push(body);
          (StatusCode::CREATED, Json(json!({ "uuid": "app-2" })))
        },
      ),
    )
    .route(
      "/api/v1/applications/{uuid}/envs/{env_uuid}",
      axum::routing::delete(
        |State(rec): State<Recorded>,
         Path((_uuid, env_uuid)): Path<(String, String)>| async move {
          rec.lifecycle_calls.lock().unwrap().push(env_uuid);
          StatusCode::OK
        },
      ),
    )
    .route(
      "/api/v1/applications/dockerfile",
      post(
        |State(rec): State<Recorded>,
         Json(body): Json<Value>| async move {
          rec.bodies.lock().unwrap().push(body);
          (StatusCode::CREATED, Json(json!({ "uuid": "app-1" })))
        },
      ),
    )
    .route(
      "/api/v1/applications/{uuid}",
      get(|Path(uuid): Path<String>| async move {
        Json(json!({
          "uuid": uuid,
          "name": "opencode-hello-world",
          "fqdn": "https://opencode-hello-world.apps.example.com",
          "status": "running:healthy",
        }))
      })
      .patch(
        |State(rec): State<Recorded>,
         Json(body): Json<Value>| async move {
          rec.bodies.lock().unwrap().push(body);
          StatusCode::OK
        },
      )
      .delete(|Path(uuid): Path<String>| async move {
        match uuid.as_str() {
          "nope" => StatusCode::NOT_FOUND,
          _ => StatusCode::OK,
        }
      }),
    )
    // Lifecycle endpoints only answer GET, like the platform.
    .route(
      "/api/v1/applications/{uuid}/{action}",
      get(
        |State(rec): State<Recorded>,
         Path((_uuid, action)): Path<(String, String)>| async move {
          rec.lifecycle_calls.lock().unwrap().push(action);
          Json(json!({ "message": "ok" }))
        },
      ),
    )
    .route(
      "/api/v1/deploy",
      get(
        |State(rec): State<Recorded>,
         Query(query): Query<
          std::collections::HashMap<String, String>,
        >| async move {
          rec
            .bodies
            .lock()
            .unwrap()
            .push(serde_json::to_value(query).unwrap());
          Json(json!({
            "deployments": [{
              "message": "deployment queued",
              "deployment_uuid": "D1",
            }]
          }))
        },
      ),
    )
    .route(
      "/api/v1/applications/{uuid}/envs",
      get(|| async {
        Json(json!([
          { "uuid": "e1", "key": "OPENCODE_PORT", "value": "4096", "is_preview": false },
          { "uuid": "e2", "key": "OPENCODE_PORT", "value": "4096", "is_preview": true },
          { "uuid": "e3", "key": "PROJECT_NAME", "value": "Hello World", "is_preview": false },
        ]))
      }),
    )
    .route(
      "/api/v1/applications/{uuid}/envs/bulk",
      patch(
        |State(rec): State<Recorded>,
         Json(body): Json<Value>| async move {
          rec.bodies.lock().unwrap().push(body);
          StatusCode::OK
        },
      ),
    )
    .route(
      "/api/v1/applications/{uuid}/logs",
      get(|Path(uuid): Path<String>| async move {
        match uuid.as_str() {
          "app-shape-string" => Json(json!("plain logs")),
          "app-shape-object" => {
            Json(json!({ "logs": ["one", "two"] }))
          }
          _ => Json(
            json!({ "stdout": "out line", "stderr": "err line" }),
          ),
        }
      }),
    )
    .with_state(recorded.clone());

  let listener =
    tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let address = format!("http://{}", listener.local_addr().unwrap());
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });

  let client = PlatformClient::new(
    address,
    "test-platform-token",
    Duration::from_secs(2),
  );
  (client, recorded)
}

#[tokio::test]
async fn sends_bearer_auth_header() {
  let (client, recorded) = stub_platform().await;
  client.list_servers().await.unwrap();
  let headers = recorded.auth_headers.lock().unwrap();
  assert_eq!(
    headers.as_slice(),
    ["Bearer test-platform-token"]
  );
}

#[tokio::test]
async fn dockerfile_is_base64_encoded_exactly_once() {
  let (client, recorded) = stub_platform().await;
  let dockerfile = "FROM ghcr.io/codeopen-sh/codeopen-base:latest\n";
  let created = client
    .create_app_from_dockerfile(
      "proj-1",
      "srv-1",
      "production",
      CreateAppFromDockerfile {
        name: String::from("opencode-hello-world"),
        description: String::new(),
        dockerfile: dockerfile.to_string(),
        ports_exposes: String::from("4096,4097"),
        domains: None,
        instant_deploy: false,
        health_check: HealthCheck {
          enabled: true,
          path: String::from("/session"),
          port: 4096,
        },
      },
    )
    .await
    .unwrap();
  assert_eq!(created.uuid, "app-1");

  let bodies = recorded.bodies.lock().unwrap();
  let sent = bodies[0]["dockerfile"].as_str().unwrap();
  // base64 of the raw text, not of an already encoded string
  use base64::{Engine, engine::general_purpose::STANDARD};
  assert_eq!(sent, STANDARD.encode(dockerfile));
  assert_eq!(bodies[0]["instant_deploy"], json!(false));
  assert_eq!(bodies[0]["health_check_path"], json!("/session"));
}

#[tokio::test]
async fn update_app_encodes_dockerfile_and_skips_none() {
  let (client, recorded) = stub_platform().await;
  client
    .update_app(
      "app-1",
      UpdateApp {
        ports_exposes: Some(String::from("4096,4097")),
        dockerfile: Some(String::from("FROM scratch\n")),
        ..Default::default()
      },
    )
    .await
    .unwrap();

  let bodies = recorded.bodies.lock().unwrap();
  use base64::{Engine, engine::general_purpose::STANDARD};
  assert_eq!(
    bodies[0]["dockerfile"].as_str().unwrap(),
    STANDARD.encode("FROM scratch\n")
  );
  assert_eq!(bodies[0]["ports_exposes"], json!("4096,4097"));
  // None fields must not be sent at all
  assert!(bodies[0].get("domains").is_none());
  assert!(bodies[0].get("name").is_none());
}

#[tokio::test]
async fn lifecycle_actions_use_get_semantics() {
  let (client, recorded) = stub_platform().await;
  client.start_app("app-1").await.unwrap();
  client.stop_app("app-1").await.unwrap();
  client.restart_app("app-1").await.unwrap();
  let calls = recorded.lifecycle_calls.lock().unwrap();
  assert_eq!(calls.as_slice(), ["start", "stop", "restart"]);
}

#[tokio::test]
async fn deploy_uses_get_with_uuid_and_optional_force() {
  let (client, recorded) = stub_platform().await;

  let res = client.deploy_app("app-1", false).await.unwrap();
  assert_eq!(res.deployments[0].deployment_uuid, "D1");
  assert_eq!(res.deployments[0].message, "deployment queued");

  client.deploy_app("app-1", true).await.unwrap();

  let bodies = recorded.bodies.lock().unwrap();
  assert_eq!(bodies[0], json!({ "uuid": "app-1" }));
  assert_eq!(
    bodies[1],
    json!({ "uuid": "app-1", "force": "true" })
  );
}

#[tokio::test]
async fn env_var_preview_twins_can_be_filtered() {
  let (client, _) = stub_platform().await;

  let all = client.list_env_vars("app-1", false).await.unwrap();
  assert_eq!(all.len(), 3);

  let production =
    client.list_env_vars("app-1", true).await.unwrap();
  assert_eq!(production.len(), 2);
  assert!(production.iter().all(|v| !v.is_preview));
}

#[tokio::test]
async fn bulk_set_env_vars_sends_sorted_data() {
  let (client, recorded) = stub_platform().await;
  let env = [
    (String::from("PROJECT_NAME"), String::from("Hello World")),
    (String::from("OPENCODE_PORT"), String::from("4096")),
  ]
  .into_iter()
  .collect();
  client.bulk_set_env_vars("app-1", &env).await.unwrap();

  let bodies = recorded.bodies.lock().unwrap();
  let data = bodies[0]["data"].as_array().unwrap();
  assert_eq!(data.len(), 2);
  // sorted by key for deterministic writes
  assert_eq!(data[0]["key"], json!("OPENCODE_PORT"));
  assert_eq!(data[1]["key"], json!("PROJECT_NAME"));
  assert_eq!(data[1]["value"], json!("Hello World"));
}

#[tokio::test]
async fn logs_shapes_all_normalize() {
  let (client, _) = stub_platform().await;
  assert_eq!(
    client.get_logs("app-shape-string", 100).await.unwrap(),
    "plain logs"
  );
  assert_eq!(
    client.get_logs("app-shape-object", 100).await.unwrap(),
    "one\ntwo"
  );
  assert_eq!(
    client.get_logs("app-shape-streams", 100).await.unwrap(),
    "out line\nerr line"
  );
}

#[tokio::test]
async fn discovery_and_image_create_round_trip() {
  use platform_client::CreateAppFromDockerImage;

  let (client, recorded) = stub_platform().await;

  let projects = client.list_projects().await.unwrap();
  assert_eq!(projects[0].uuid, "proj-1");

  let created = client
    .create_app_from_docker_image(
      "proj-1",
      "srv-1",
      "production",
      CreateAppFromDockerImage {
        name: String::from("opencode-prebuilt"),
        docker_registry_image_name: String::from(
          "ghcr.io/codeopen-sh/codeopen-base",
        ),
        docker_registry_image_tag: String::from("latest"),
        ports_exposes: String::from("4096,4097"),
        ..Default::default()
      },
    )
    .await
    .unwrap();
  assert_eq!(created.uuid, "app-2");

  let bodies = recorded.bodies.lock().unwrap();
  assert_eq!(
    bodies[0]["docker_registry_image_name"],
    json!("ghcr.io/codeopen-sh/codeopen-base")
  );
  assert_eq!(bodies[0]["environment_name"], json!("production"));
}

#[tokio::test]
async fn delete_env_var_targets_the_env_uuid() {
  let (client, recorded) = stub_platform().await;
  client.delete_env_var("app-1", "env-uuid-9").await.unwrap();
  let calls = recorded.lifecycle_calls.lock().unwrap();
  assert_eq!(calls.as_slice(), ["env-uuid-9"]);
}

#[tokio::test]
async fn missing_app_is_not_found() {
  let (client, _) = stub_platform().await;
  // Route not registered: DELETE on an unknown path 404s.
  let err = client.delete_app("nope").await.unwrap_err();
  assert!(matches!(err, PlatformError::NotFound { .. }));
}
