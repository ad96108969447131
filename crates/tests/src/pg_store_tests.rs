//! End-to-end checks against Postgres. Skipped unless `TEST_DATABASE_URL` is set.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn test_pg_health_reports_postgres() {
    let Some((app, _pool, _guard)) = common::pg_test_app().await else {
        return;
    };

    let (status, response) = common::get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["store"], "postgres");
    assert_eq!(response["store_status"], "connected");
}

#[tokio::test]
async fn test_pg_ownership_and_progress() {
    let Some((app, _pool, _guard)) = common::pg_test_app().await else {
        return;
    };
    let alice = common::create_user(&app, "alice").await;
    let bob = common::create_user(&app, "bob").await;
    let list = common::create_list(&app, alice, "Groceries").await;

    let milk = common::create_task(&app, alice, list, json!({ "title": "Milk" })).await;
    common::create_task(&app, alice, list, json!({ "title": "Eggs", "priority": "HIGH" })).await;
    common::post_empty(
        &app,
        &format!("{}/{}/toggle", common::tasks_uri(alice, list), milk["id"]),
    )
    .await;

    let (status, summary) =
        common::get(&app, &format!("{}/{list}", common::lists_uri(alice))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["owner_username"], "alice");
    assert_eq!(summary["task_count"], 2);
    assert_eq!(summary["completed_task_count"], 1);
    assert_eq!(summary["progress_percentage"], 50);

    let (status, _) = common::get(&app, &format!("{}/{list}", common::lists_uri(bob))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, high) =
        common::get(&app, &format!("{}/priority/HIGH", common::tasks_uri(alice, list))).await;
    assert_eq!(high[0]["title"], "Eggs");
}

#[tokio::test]
async fn test_pg_duplicate_username_conflicts() {
    let Some((app, _pool, _guard)) = common::pg_test_app().await else {
        return;
    };
    common::create_user(&app, "carol").await;

    let body = json!({
        "username": "carol",
        "email": "carol2@example.com",
        "password": "password123"
    });
    let (status, _) = common::post_json(&app, "/api/v1/users", &body.to_string()).await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_pg_stale_list_update_conflicts() {
    let Some((app, _pool, _guard)) = common::pg_test_app().await else {
        return;
    };
    let user = common::create_user(&app, "dave").await;
    let list = common::create_list(&app, user, "Draft").await;
    let uri = format!("{}/{list}", common::lists_uri(user));

    let (status, _) =
        common::put_json(&app, &uri, &json!({ "title": "v1", "version": 0 }).to_string()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) =
        common::put_json(&app, &uri, &json!({ "title": "v2", "version": 0 }).to_string()).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_pg_list_delete_cascades_tasks() {
    let Some((app, pool, _guard)) = common::pg_test_app().await else {
        return;
    };
    let user = common::create_user(&app, "erin").await;
    let list = common::create_list(&app, user, "Temporary").await;
    common::create_task(&app, user, list, json!({ "title": "one" })).await;
    common::create_task(&app, user, list, json!({ "title": "two" })).await;

    let (status, _) = common::delete(&app, &format!("{}/{list}", common::lists_uri(user))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM todo_tasks WHERE todo_list_id = $1")
        .bind(list)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn test_pg_search_escapes_wildcards() {
    let Some((app, _pool, _guard)) = common::pg_test_app().await else {
        return;
    };
    let user = common::create_user(&app, "frank").await;
    common::create_list(&app, user, "100% done").await;
    common::create_list(&app, user, "1000 things").await;

    let (_, hits) =
        common::get(&app, &format!("{}/search?title=0%25", common::lists_uri(user))).await;

    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["title"], "100% done");
}
