use axum::http::StatusCode;
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common;

fn titles(response: &Value) -> Vec<String> {
    response
        .as_array()
        .expect("array of tasks")
        .iter()
        .map(|t| t["title"].as_str().unwrap().to_string())
        .collect()
}

/// A user with one list, returned as (user_id, list_id).
async fn user_with_list(app: &axum::Router, username: &str) -> (i64, i64) {
    let user = common::create_user(app, username).await;
    let list = common::create_list(app, user, "Groceries").await;
    (user, list)
}

#[tokio::test]
async fn test_create_task_defaults() {
    let app = common::test_app();
    let (user, list) = user_with_list(&app, "alice").await;

    let task = common::create_task(&app, user, list, json!({ "title": "Milk" })).await;

    assert_eq!(task["title"], "Milk");
    assert_eq!(task["todo_list_id"], list);
    assert_eq!(task["completed"], false);
    assert_eq!(task["priority"], "MEDIUM");
    assert_eq!(task["overdue"], false);
    assert!(task.get("due_date").is_none());
}

#[tokio::test]
async fn test_create_task_with_past_due_date_is_rejected() {
    let app = common::test_app();
    let (user, list) = user_with_list(&app, "alice").await;
    let yesterday = (Utc::now() - Duration::days(1)).to_rfc3339();

    let (status, response) = common::post_json(
        &app,
        &common::tasks_uri(user, list),
        &json!({ "title": "Late", "due_date": yesterday }).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response["field_errors"].get("due_date").is_some());

    let (_, count) = common::get(&app, &format!("{}/count", common::tasks_uri(user, list))).await;
    assert_eq!(count["count"], 0);
}

#[tokio::test]
async fn test_create_task_with_unknown_priority_is_rejected() {
    let app = common::test_app();
    let (user, list) = user_with_list(&app, "alice").await;

    let (status, _) = common::post_json(
        &app,
        &common::tasks_uri(user, list),
        &json!({ "title": "Odd", "priority": "SOMEDAY" }).to_string(),
    )
    .await;

    assert!(status.is_client_error(), "got {status}");
}

#[tokio::test]
async fn test_tasks_in_foreign_list_are_invisible() {
    let app = common::test_app();
    let (alice, list) = user_with_list(&app, "alice").await;
    let bob = common::create_user(&app, "bob").await;
    let task = common::create_task(&app, alice, list, json!({ "title": "Secret" })).await;
    let task_id = task["id"].as_i64().unwrap();

    let foreign = common::tasks_uri(bob, list);

    let (status, _) = common::get(&app, &foreign).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::get(&app, &format!("{foreign}/{task_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) =
        common::post_json(&app, &foreign, &json!({ "title": "Sneaky" }).to_string()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::post_empty(&app, &format!("{foreign}/{task_id}/toggle")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::delete(&app, &format!("{foreign}/{task_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, own) = common::get(&app, &common::tasks_uri(alice, list)).await;
    assert_eq!(titles(&own), vec!["Secret"]);
}

#[tokio::test]
async fn test_task_from_another_list_of_same_owner_is_not_found() {
    let app = common::test_app();
    let (user, first) = user_with_list(&app, "alice").await;
    let second = common::create_list(&app, user, "Work").await;
    let task = common::create_task(&app, user, first, json!({ "title": "Milk" })).await;

    let (status, _) = common::get(
        &app,
        &format!("{}/{}", common::tasks_uri(user, second), task["id"]),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_groceries_progress_flow() {
    let app = common::test_app();
    let (user, list) = user_with_list(&app, "shopper").await;
    let list_uri = format!("{}/{list}", common::lists_uri(user));
    let tasks_uri = common::tasks_uri(user, list);

    let milk = common::create_task(&app, user, list, json!({ "title": "Milk" })).await;
    common::create_task(&app, user, list, json!({ "title": "Eggs", "priority": "HIGH" })).await;
    common::create_task(&app, user, list, json!({ "title": "Bread", "priority": "LOW" })).await;

    let (status, toggled) =
        common::post_empty(&app, &format!("{tasks_uri}/{}/toggle", milk["id"])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["completed"], true);

    let (_, summary) = common::get(&app, &list_uri).await;
    assert_eq!(summary["task_count"], 3);
    assert_eq!(summary["completed_task_count"], 1);
    assert_eq!(summary["progress_percentage"], 33);

    let (_, completed) = common::get(&app, &format!("{tasks_uri}/count/completed")).await;
    assert_eq!(completed, json!({ "count": 1 }));

    let (_, done) = common::get(&app, &format!("{tasks_uri}/status?completed=true")).await;
    assert_eq!(titles(&done), vec!["Milk"]);

    let (_, open) = common::get(&app, &format!("{tasks_uri}/status?completed=false")).await;
    assert_eq!(titles(&open), vec!["Eggs", "Bread"]);

    let (_, high) = common::get(&app, &format!("{tasks_uri}/priority/high")).await;
    assert_eq!(titles(&high), vec!["Eggs"]);

    // Toggling twice restores the original state.
    let (_, toggled) =
        common::post_empty(&app, &format!("{tasks_uri}/{}/toggle", milk["id"])).await;
    assert_eq!(toggled["completed"], false);
    let (_, summary) = common::get(&app, &list_uri).await;
    assert_eq!(summary["progress_percentage"], 0);
}

#[tokio::test]
async fn test_unknown_priority_path_is_bad_request() {
    let app = common::test_app();
    let (user, list) = user_with_list(&app, "alice").await;

    let (status, response) = common::get(
        &app,
        &format!("{}/priority/someday", common::tasks_uri(user, list)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["kind"], "BadRequest");
}

#[tokio::test]
async fn test_set_priority_and_due_date() {
    let app = common::test_app();
    let (user, list) = user_with_list(&app, "planner").await;
    let task = common::create_task(&app, user, list, json!({ "title": "Report" })).await;
    let task_uri = format!("{}/{}", common::tasks_uri(user, list), task["id"]);

    let (status, response) = common::patch_json(
        &app,
        &format!("{task_uri}/priority"),
        &json!({ "priority": "URGENT" }).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["priority"], "URGENT");
    assert_eq!(response["version"], 1);

    let due = Utc::now() + Duration::days(3);
    let (status, response) = common::patch_json(
        &app,
        &format!("{task_uri}/due-date"),
        &json!({ "due_date": due.to_rfc3339() }).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(response["due_date"].is_string());
    assert_eq!(response["overdue"], false);

    let (status, response) = common::patch_json(
        &app,
        &format!("{task_uri}/due-date"),
        &json!({ "due_date": null }).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.get("due_date").is_none());
}

#[tokio::test]
async fn test_overdue_tasks_exclude_completed_and_undated() {
    let app = common::test_app();
    let (user, list) = user_with_list(&app, "late").await;
    let tasks_uri = common::tasks_uri(user, list);
    let past = (Utc::now() - Duration::hours(2)).to_rfc3339();

    let late = common::create_task(&app, user, list, json!({ "title": "Late" })).await;
    let done = common::create_task(&app, user, list, json!({ "title": "Done late" })).await;
    common::create_task(&app, user, list, json!({ "title": "Undated" })).await;

    for task in [&late, &done] {
        let (status, _) = common::patch_json(
            &app,
            &format!("{tasks_uri}/{}/due-date", task["id"]),
            &json!({ "due_date": past }).to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    common::post_empty(&app, &format!("{tasks_uri}/{}/toggle", done["id"])).await;

    let (status, overdue) = common::get(&app, &format!("{tasks_uri}/overdue")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&overdue), vec!["Late"]);
    assert_eq!(overdue[0]["overdue"], true);
}

#[tokio::test]
async fn test_update_task_replaces_fields_and_checks_version() {
    let app = common::test_app();
    let (user, list) = user_with_list(&app, "writer").await;
    let task = common::create_task(&app, user, list, json!({ "title": "Draft" })).await;
    let task_uri = format!("{}/{}", common::tasks_uri(user, list), task["id"]);

    let body = json!({
        "title": "Final",
        "description": "ship it",
        "completed": true,
        "priority": "HIGH",
        "version": 0
    });
    let (status, response) = common::put_json(&app, &task_uri, &body.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["title"], "Final");
    assert_eq!(response["completed"], true);
    assert_eq!(response["priority"], "HIGH");
    assert_eq!(response["version"], 1);

    let stale = json!({ "title": "Overwritten", "version": 0 });
    let (status, response) = common::put_json(&app, &task_uri, &stale.to_string()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(response["kind"], "Conflict");

    let (_, current) = common::get(&app, &task_uri).await;
    assert_eq!(current["title"], "Final");
}

#[tokio::test]
async fn test_search_tasks_by_title() {
    let app = common::test_app();
    let (user, list) = user_with_list(&app, "finder").await;
    common::create_task(&app, user, list, json!({ "title": "Buy milk" })).await;
    common::create_task(&app, user, list, json!({ "title": "Oat MILK" })).await;
    common::create_task(&app, user, list, json!({ "title": "Bread" })).await;

    let (status, response) = common::get(
        &app,
        &format!("{}/search?title=milk", common::tasks_uri(user, list)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&response), vec!["Buy milk", "Oat MILK"]);
}

#[tokio::test]
async fn test_paged_tasks_sorted_by_priority() {
    let app = common::test_app();
    let (user, list) = user_with_list(&app, "triage").await;
    for (title, priority) in [("b", "LOW"), ("a", "URGENT"), ("c", "MEDIUM"), ("d", "HIGH")] {
        common::create_task(&app, user, list, json!({ "title": title, "priority": priority }))
            .await;
    }

    let (status, response) = common::get(
        &app,
        &format!(
            "{}/paged?sort=priority&direction=desc&limit=3",
            common::tasks_uri(user, list)
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&response["data"]), vec!["a", "d", "c"]);
    assert_eq!(response["meta"]["total"], 4);
    assert_eq!(response["meta"]["has_next"], true);
}

#[tokio::test]
async fn test_delete_task_and_delete_all() {
    let app = common::test_app();
    let (user, list) = user_with_list(&app, "tidy").await;
    let tasks_uri = common::tasks_uri(user, list);
    let first = common::create_task(&app, user, list, json!({ "title": "One" })).await;
    common::create_task(&app, user, list, json!({ "title": "Two" })).await;
    common::create_task(&app, user, list, json!({ "title": "Three" })).await;

    let (status, _) = common::delete(&app, &format!("{tasks_uri}/{}", first["id"])).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = common::delete(&app, &format!("{tasks_uri}/{}", first["id"])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, count) = common::get(&app, &format!("{tasks_uri}/count")).await;
    assert_eq!(count["count"], 2);

    let (status, _) = common::delete(&app, &tasks_uri).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, count) = common::get(&app, &format!("{tasks_uri}/count")).await;
    assert_eq!(count["count"], 0);

    // The list itself survives.
    let (status, _) = common::get(&app, &format!("{}/{list}", common::lists_uri(user))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_user_tasks_span_all_lists() {
    let app = common::test_app();
    let (alice, groceries) = user_with_list(&app, "alice").await;
    let work = common::create_list(&app, alice, "Work").await;
    let (bob, bobs) = user_with_list(&app, "bob").await;

    common::create_task(&app, alice, groceries, json!({ "title": "Milk" })).await;
    common::create_task(&app, alice, work, json!({ "title": "Report" })).await;
    common::create_task(&app, bob, bobs, json!({ "title": "Not mine" })).await;

    let (status, response) = common::get(&app, &format!("/api/v1/users/{alice}/tasks")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&response), vec!["Milk", "Report"]);

    let (status, _) = common::get(&app, "/api/v1/users/777/tasks").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
