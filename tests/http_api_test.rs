use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as JsonValue};
use sessions_backend::{config::Config, database::memory::MemoryUserStore, router, AppState};
use tower::ServiceExt;

const ADMIN_TOKEN: &str = "admin_test_token";

fn setup_app() -> Router {
    let config = Config {
        admin_token: Some(ADMIN_TOKEN.to_string()),
        ..Config::default()
    };
    let state = AppState::new(Arc::new(MemoryUserStore::new()), &config);
    router(state)
}

async fn send(app: &Router, body: JsonValue, admin: bool) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1")
        .header("content-type", "application/json");
    if admin {
        builder = builder.header("x-admin-token", ADMIN_TOKEN);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_reports_ok() {
    let app = setup_app();
    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn account_lifecycle_over_http() {
    let app = setup_app();

    let (status, body) = send(
        &app,
        json!({"id": "1", "method": "create_user", "params": {"username": "bob", "email": "b@x.com", "password": "pw"}}),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["id"], "1");
    assert_eq!(body["data"]["user"]["username"], "bob");
    assert!(body["data"]["user"].get("password").is_none());
    let apikey = body["data"]["user"]["apikey"].as_str().unwrap().to_string();

    let get = json!({"method": "get_user", "params": {"apikey": apikey}});
    let (_, first) = send(&app, get.clone(), true).await;
    let (_, second) = send(&app, get.clone(), true).await;
    assert_eq!(first, second);

    // set_password is public: no admin token needed
    let (status, body) = send(
        &app,
        json!({"method": "set_password", "params": {"apikey": apikey, "password": "pw2"}}),
        false,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body.get("data").is_none());

    let (_, third) = send(&app, get, true).await;
    assert_ne!(
        third["data"]["user"]["updated_at"],
        first["data"]["user"]["updated_at"]
    );
}

#[tokio::test]
async fn private_methods_need_the_admin_token() {
    let app = setup_app();
    let (status, body) = send(&app, json!({"method": "get_users"}), false).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], "error");

    let (status, body) = send(&app, json!({"method": "get_users"}), true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn dispatcher_errors_map_to_status_codes() {
    let app = setup_app();

    let (status, body) = send(&app, json!({"method": "get_user"}), true).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing parameters");
    assert_eq!(body["version"], "0.0.1");

    let (status, body) = send(&app, json!({"method": "frobnicate"}), true).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "method not found");

    let (status, _) = send(
        &app,
        json!({"method": "get_user", "params": {"username": "ghost"}}),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, json!({"method": "set_password"}), false).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing parameters");
}

#[tokio::test]
async fn malformed_body_on_privileged_channel_is_a_parse_error() {
    let app = setup_app();
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1")
        .header("x-admin-token", ADMIN_TOKEN)
        .body(Body::from("{\"method\": \"ping\", \"params\": 7}"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["version"], "");
}
