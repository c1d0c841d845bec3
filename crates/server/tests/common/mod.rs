#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

use worklog_server::{app, config::Config, db::Database, AppState};

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";

/// Build the full application router over the given test pool.
pub fn build_test_app(pool: SqlitePool) -> Router {
    app(AppState {
        db: Database::from_pool(pool),
        config: Config::default(),
    })
}

async fn send(app: Router, method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str, user: &str) -> Response {
    send(app, Method::GET, uri, Some(user), None).await
}

pub async fn get_anonymous(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn post_json(app: Router, uri: &str, user: &str, body: Value) -> Response {
    send(app, Method::POST, uri, Some(user), Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, user: &str, body: Value) -> Response {
    send(app, Method::PUT, uri, Some(user), Some(body)).await
}

pub async fn delete(app: Router, uri: &str, user: &str) -> Response {
    send(app, Method::DELETE, uri, Some(user), None).await
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

/// Create a project for `user` and return its id.
pub async fn create_project(pool: &SqlitePool, user: &str, name: &str, code: &str) -> String {
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/projects",
        user,
        serde_json::json!({ "name": name, "code": code }),
    )
    .await;
    body_json(response).await["id"].as_str().unwrap().to_string()
}

/// Create a work item under `project_id` and return its id.
pub async fn create_work_item(
    pool: &SqlitePool,
    user: &str,
    project_id: &str,
    name: &str,
    parent_id: Option<&str>,
) -> String {
    let response = post_json(
        build_test_app(pool.clone()),
        &format!("/api/projects/{project_id}/work-items"),
        user,
        serde_json::json!({ "name": name, "parent_id": parent_id }),
    )
    .await;
    body_json(response).await["id"].as_str().unwrap().to_string()
}
