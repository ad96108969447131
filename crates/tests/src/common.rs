use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use server::db::AppState;
use sqlx::{Pool, Postgres};
use tokio::sync::Mutex;
use tower::ServiceExt;

/// Serializes the tests that share the Postgres test database.
static TEST_MUTEX: Mutex<()> = Mutex::const_new(());

/// Build a router over a fresh in-memory store.
pub fn test_app() -> Router {
    server::app(AppState::in_memory())
}

/// Build a router over the Postgres test database, migrated and truncated.
/// Returns `None` when `TEST_DATABASE_URL` is not set so the suite can be
/// skipped on machines without a database.
pub async fn pg_test_app() -> Option<(Router, Pool<Postgres>, tokio::sync::MutexGuard<'static, ()>)> {
    let _ = dotenvy::dotenv();
    let database_url = std::env::var("TEST_DATABASE_URL").ok()?;

    let guard = TEST_MUTEX.lock().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    server::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    sqlx::query("TRUNCATE todo_tasks, todo_lists, users RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to truncate");

    let state = AppState::postgres(pool.clone(), Default::default());
    Some((server::app(state), pool, guard))
}

/// Base path of a user's todo lists.
pub fn lists_uri(user_id: i64) -> String {
    format!("/api/v1/users/{user_id}/todolists")
}

/// Base path of the tasks in one list.
pub fn tasks_uri(user_id: i64, list_id: i64) -> String {
    format!("/api/v1/users/{user_id}/todolists/{list_id}/tasks")
}

/// Register a user and return its id.
pub async fn create_user(app: &Router, username: &str) -> i64 {
    let body = json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "password123",
    });
    let (status, response) = post_json(app, "/api/v1/users", &body.to_string()).await;
    assert_eq!(status, StatusCode::CREATED, "register {username}: {response}");
    response["id"].as_i64().expect("user id")
}

/// Create a todo list for a user and return its id.
pub async fn create_list(app: &Router, user_id: i64, title: &str) -> i64 {
    let body = json!({ "title": title });
    let (status, response) = post_json(app, &lists_uri(user_id), &body.to_string()).await;
    assert_eq!(status, StatusCode::CREATED, "create list {title}: {response}");
    response["id"].as_i64().expect("list id")
}

/// Create a task from a JSON body and return the created task.
pub async fn create_task(app: &Router, user_id: i64, list_id: i64, body: Value) -> Value {
    let (status, response) =
        post_json(app, &tasks_uri(user_id, list_id), &body.to_string()).await;
    assert_eq!(status, StatusCode::CREATED, "create task: {response}");
    response
}

/// POST JSON to a route.
pub async fn post_json(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    send_json(app, "POST", uri, body).await
}

/// PUT JSON to a route.
pub async fn put_json(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    send_json(app, "PUT", uri, body).await
}

/// PATCH JSON to a route.
pub async fn patch_json(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    send_json(app, "PATCH", uri, body).await
}

/// POST without a body.
pub async fn post_empty(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, req).await
}

/// GET a route.
pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, req).await
}

/// DELETE a route.
pub async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, req).await
}

async fn send_json(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    send(app, req).await
}

/// Send a request through the router and parse the response.
async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(req)
        .await
        .expect("Failed to send request");

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");

    let body: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&body_bytes).to_string(),
        ))
    };

    (status, body)
}

/// Send a request and return status, headers and raw bytes (for non-JSON
/// responses like the docs page).
pub async fn send_raw(
    app: &Router,
    req: Request<Body>,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(req)
        .await
        .expect("Failed to send request");

    let status = response.status();
    let headers = response.headers().clone();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");

    (status, headers, body_bytes.to_vec())
}
