use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn test_create_todo_list_success() {
    let app = common::test_app();
    let user = common::create_user(&app, "alice").await;

    let body = json!({ "title": "Groceries", "description": "Weekly shop" });
    let (status, response) =
        common::post_json(&app, &common::lists_uri(user), &body.to_string()).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(response["title"], "Groceries");
    assert_eq!(response["description"], "Weekly shop");
    assert_eq!(response["owner_id"], user);
    assert_eq!(response["owner_username"], "alice");
    assert_eq!(response["task_count"], 0);
    assert_eq!(response["completed_task_count"], 0);
    assert_eq!(response["progress_percentage"], 0);
}

#[tokio::test]
async fn test_create_todo_list_blank_title_is_rejected() {
    let app = common::test_app();
    let user = common::create_user(&app, "alice").await;

    let (status, response) = common::post_json(
        &app,
        &common::lists_uri(user),
        &json!({ "title": "   " }).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response["field_errors"].get("title").is_some());
}

#[tokio::test]
async fn test_create_todo_list_for_unknown_user_is_not_found() {
    let app = common::test_app();

    let (status, _) = common::post_json(
        &app,
        &common::lists_uri(404),
        &json!({ "title": "Orphan" }).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_foreign_list_looks_like_a_missing_list() {
    let app = common::test_app();
    let alice = common::create_user(&app, "alice").await;
    let bob = common::create_user(&app, "bob").await;
    let list = common::create_list(&app, alice, "Private").await;

    let (status, foreign) =
        common::get(&app, &format!("{}/{list}", common::lists_uri(bob))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Same shape as a list id nobody owns.
    let (status, missing) =
        common::get(&app, &format!("{}/{}", common::lists_uri(bob), list + 1000)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(foreign["kind"], missing["kind"]);
    assert_eq!(
        foreign["message"],
        json!(format!("Todo list {list} not found"))
    );

    let (status, own) = common::get(&app, &format!("{}/{list}", common::lists_uri(alice))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(own["title"], "Private");
}

#[tokio::test]
async fn test_foreign_update_and_delete_leave_the_list_alone() {
    let app = common::test_app();
    let alice = common::create_user(&app, "alice").await;
    let bob = common::create_user(&app, "bob").await;
    let list = common::create_list(&app, alice, "Private").await;
    let foreign_uri = format!("{}/{list}", common::lists_uri(bob));

    let (status, _) =
        common::put_json(&app, &foreign_uri, &json!({ "title": "Mine now" }).to_string()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::delete(&app, &foreign_uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, own) = common::get(&app, &format!("{}/{list}", common::lists_uri(alice))).await;
    assert_eq!(own["title"], "Private");
}

#[tokio::test]
async fn test_list_endpoints_only_show_own_lists() {
    let app = common::test_app();
    let alice = common::create_user(&app, "alice").await;
    let bob = common::create_user(&app, "bob").await;
    common::create_list(&app, alice, "Alice one").await;
    common::create_list(&app, alice, "Alice two").await;
    common::create_list(&app, bob, "Bob one").await;

    let (_, all) = common::get(&app, &format!("{}/all", common::lists_uri(alice))).await;
    let titles: Vec<&str> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Alice one", "Alice two"]);

    let (_, count) = common::get(&app, &format!("{}/count", common::lists_uri(bob))).await;
    assert_eq!(count, json!({ "count": 1 }));
}

#[tokio::test]
async fn test_paginated_lists_report_meta() {
    let app = common::test_app();
    let user = common::create_user(&app, "pager").await;
    for i in 1..=15 {
        common::create_list(&app, user, &format!("List {i:02}")).await;
    }

    let (status, response) =
        common::get(&app, &format!("{}?page=2&limit=10", common::lists_uri(user))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"].as_array().unwrap().len(), 5);
    assert_eq!(
        response["meta"],
        json!({
            "page": 2,
            "limit": 10,
            "total": 15,
            "total_pages": 2,
            "has_next": false,
            "has_prev": true
        })
    );
}

#[tokio::test]
async fn test_paginated_lists_sort_by_id() {
    let app = common::test_app();
    let user = common::create_user(&app, "sorter").await;
    for title in ["Banana", "apple", "Cherry"] {
        common::create_list(&app, user, title).await;
    }

    let (status, response) = common::get(
        &app,
        &format!("{}?sort=id&direction=asc", common::lists_uri(user)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = response["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Banana", "apple", "Cherry"]);

    let (_, response) = common::get(
        &app,
        &format!("{}?sort=id&direction=desc&limit=1", common::lists_uri(user)),
    )
    .await;
    assert_eq!(response["data"][0]["title"], "Cherry");
    assert_eq!(response["meta"]["has_next"], true);
}

#[tokio::test]
async fn test_paginated_lists_clamp_limit() {
    let app = common::test_app();
    let user = common::create_user(&app, "clamp").await;

    let (status, response) =
        common::get(&app, &format!("{}?limit=500&page=0", common::lists_uri(user))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["meta"]["limit"], 100);
    assert_eq!(response["meta"]["page"], 1);
}

#[tokio::test]
async fn test_paginated_lists_reject_unknown_or_task_only_sort() {
    let app = common::test_app();
    let user = common::create_user(&app, "strict").await;

    let (status, response) =
        common::get(&app, &format!("{}?sort=owner", common::lists_uri(user))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["kind"], "BadRequest");

    let (status, _) =
        common::get(&app, &format!("{}?sort=priority", common::lists_uri(user))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        common::get(&app, &format!("{}?direction=sideways", common::lists_uri(user))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_lists_by_title_ignores_case() {
    let app = common::test_app();
    let user = common::create_user(&app, "searcher").await;
    common::create_list(&app, user, "Groceries").await;
    common::create_list(&app, user, "Work").await;
    common::create_list(&app, user, "grocery run 100%").await;

    let (status, response) =
        common::get(&app, &format!("{}/search?title=GROC", common::lists_uri(user))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response.as_array().unwrap().len(), 2);

    // `%` is matched literally.
    let (_, response) =
        common::get(&app, &format!("{}/search?title=%25", common::lists_uri(user))).await;
    let hits = response.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["title"], "grocery run 100%");
}

#[tokio::test]
async fn test_lists_ranked_by_progress() {
    let app = common::test_app();
    let user = common::create_user(&app, "ranker").await;
    let half = common::create_list(&app, user, "Half").await;
    let done = common::create_list(&app, user, "Done").await;
    common::create_list(&app, user, "Empty").await;

    common::create_task(&app, user, half, json!({ "title": "a", "completed": true })).await;
    common::create_task(&app, user, half, json!({ "title": "b" })).await;
    common::create_task(&app, user, done, json!({ "title": "c", "completed": true })).await;
    common::create_task(&app, user, done, json!({ "title": "d", "completed": true })).await;

    let (status, response) =
        common::get(&app, &format!("{}/progress", common::lists_uri(user))).await;

    assert_eq!(status, StatusCode::OK);
    let ranked: Vec<(String, i64)> = response["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| {
            (
                l["title"].as_str().unwrap().to_string(),
                l["progress_percentage"].as_i64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        ranked,
        vec![
            ("Done".to_string(), 100),
            ("Half".to_string(), 50),
            ("Empty".to_string(), 0),
        ]
    );
}

#[tokio::test]
async fn test_update_list_checks_version() {
    let app = common::test_app();
    let user = common::create_user(&app, "editor").await;
    let list = common::create_list(&app, user, "Draft").await;
    let uri = format!("{}/{list}", common::lists_uri(user));

    let (status, response) = common::put_json(
        &app,
        &uri,
        &json!({ "title": "Final", "description": "done", "version": 0 }).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["title"], "Final");
    assert_eq!(response["version"], 1);

    let (status, response) = common::put_json(
        &app,
        &uri,
        &json!({ "title": "Lost update", "version": 0 }).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(response["kind"], "Conflict");

    let (_, current) = common::get(&app, &uri).await;
    assert_eq!(current["title"], "Final");
}

#[tokio::test]
async fn test_delete_list_removes_its_tasks() {
    let app = common::test_app();
    let user = common::create_user(&app, "cleaner").await;
    let list = common::create_list(&app, user, "Temporary").await;
    let task = common::create_task(&app, user, list, json!({ "title": "gone" })).await;

    let (status, _) = common::delete(&app, &format!("{}/{list}", common::lists_uri(user))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = common::get(
        &app,
        &format!("{}/{}", common::tasks_uri(user, list), task["id"]),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::get(&app, &common::tasks_uri(user, list)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, tasks) = common::get(&app, &format!("/api/v1/users/{user}/tasks")).await;
    assert_eq!(tasks, json!([]));
}

#[tokio::test]
async fn test_delete_all_lists_only_touches_the_owner() {
    let app = common::test_app();
    let alice = common::create_user(&app, "alice").await;
    let bob = common::create_user(&app, "bob").await;
    common::create_list(&app, alice, "One").await;
    common::create_list(&app, alice, "Two").await;
    common::create_list(&app, bob, "Keep").await;

    let (status, _) = common::delete(&app, &common::lists_uri(alice)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, count) = common::get(&app, &format!("{}/count", common::lists_uri(alice))).await;
    assert_eq!(count["count"], 0);
    let (_, count) = common::get(&app, &format!("{}/count", common::lists_uri(bob))).await;
    assert_eq!(count["count"], 1);
}

#[tokio::test]
async fn test_update_list_ignores_owner_in_payload() {
    let app = common::test_app();
    let alice = common::create_user(&app, "alice").await;
    let bob = common::create_user(&app, "bob").await;
    let list = common::create_list(&app, alice, "Mine").await;

    let body = json!({ "title": "Still mine", "owner_id": bob });
    let (status, response) = common::put_json(
        &app,
        &format!("{}/{list}", common::lists_uri(alice)),
        &body.to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["owner_id"], alice);
    let (_, count) = common::get(&app, &format!("{}/count", common::lists_uri(bob))).await;
    assert_eq!(count["count"], 0);
}

#[tokio::test]
async fn test_single_task_list_reaches_full_progress() {
    let app = common::test_app();
    let alice = common::create_user(&app, "alice").await;
    let list = common::create_list(&app, alice, "Groceries").await;
    let milk = common::create_task(&app, alice, list, json!({ "title": "Milk" })).await;
    let tasks_uri = common::tasks_uri(alice, list);

    let (_, count) = common::get(&app, &format!("{tasks_uri}/count")).await;
    assert_eq!(count["count"], 1);

    common::post_empty(&app, &format!("{tasks_uri}/{}/toggle", milk["id"])).await;

    let (_, completed) = common::get(&app, &format!("{tasks_uri}/count/completed")).await;
    assert_eq!(completed["count"], 1);
    let (_, summary) = common::get(&app, &format!("{}/{list}", common::lists_uri(alice))).await;
    assert_eq!(summary["progress_percentage"], 100);
}

#[tokio::test]
async fn test_page_far_past_the_end_is_empty() {
    let app = common::test_app();
    let user = common::create_user(&app, "faraway").await;
    let list = common::create_list(&app, user, "Only one").await;
    common::create_task(&app, user, list, json!({ "title": "Milk" })).await;

    for uri in [
        format!("{}?page={}&limit=100", common::lists_uri(user), i64::MAX),
        format!("{}/progress?page={}", common::lists_uri(user), i64::MAX),
        format!("{}/paged?page={}", common::tasks_uri(user, list), i64::MAX),
    ] {
        let (status, response) = common::get(&app, &uri).await;

        assert_eq!(status, StatusCode::OK, "{uri}: {response}");
        assert_eq!(response["data"], json!([]));
        assert_eq!(response["meta"]["page"], i64::MAX);
        assert_eq!(response["meta"]["total"], 1);
        assert_eq!(response["meta"]["has_next"], false);
    }
}
