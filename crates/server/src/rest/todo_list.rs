use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared_types::{
    AppError, CountResponse, CreateTodoListRequest, PageParams, PaginatedResponse,
    PaginationConfig, TitleSearchParams, TodoListResponse, UpdateTodoListRequest,
};

use super::page_request;
use crate::error_convert::ValidateRequest;
use crate::repo::Repositories;
use crate::service::todo_list as lists;

fn to_responses(lists: Vec<shared_types::TodoList>) -> Vec<TodoListResponse> {
    lists.into_iter().map(TodoListResponse::from).collect()
}

/// List a user's todo lists, one page at a time.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/todolists",
    params(("user_id" = i64, Path, description = "Owner ID"), PageParams),
    responses(
        (status = 200, description = "Page of todo lists", body = PaginatedResponse<TodoListResponse>),
        (status = 400, description = "Unknown sort field or direction", body = AppError),
        (status = 404, description = "User not found", body = AppError)
    ),
    tag = "todolists"
)]
#[tracing::instrument(skip(repos, paging))]
pub async fn list_todo_lists(
    State(repos): State<Repositories>,
    State(paging): State<PaginationConfig>,
    Path(user_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Json<PaginatedResponse<TodoListResponse>>, AppError> {
    let page = page_request(&params, &paging)?;
    let (rows, total) = lists::find_all_by_user_paged(&repos, user_id, page).await?;
    Ok(Json(
        PaginatedResponse::new(rows, page.page, page.limit, total).map(TodoListResponse::from),
    ))
}

/// List every todo list of a user without paging.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/todolists/all",
    params(("user_id" = i64, Path, description = "Owner ID")),
    responses(
        (status = 200, description = "All todo lists", body = Vec<TodoListResponse>),
        (status = 404, description = "User not found", body = AppError)
    ),
    tag = "todolists"
)]
#[tracing::instrument(skip(repos))]
pub async fn list_all_todo_lists(
    State(repos): State<Repositories>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<TodoListResponse>>, AppError> {
    let rows = lists::find_all_by_user(&repos, user_id).await?;
    Ok(Json(to_responses(rows)))
}

/// Find a user's todo lists whose title contains the given text, ignoring case.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/todolists/search",
    params(("user_id" = i64, Path, description = "Owner ID"), TitleSearchParams),
    responses(
        (status = 200, description = "Matching todo lists", body = Vec<TodoListResponse>),
        (status = 404, description = "User not found", body = AppError)
    ),
    tag = "todolists"
)]
#[tracing::instrument(skip(repos))]
pub async fn search_todo_lists(
    State(repos): State<Repositories>,
    Path(user_id): Path<i64>,
    Query(params): Query<TitleSearchParams>,
) -> Result<Json<Vec<TodoListResponse>>, AppError> {
    let rows = lists::find_by_title_containing(&repos, user_id, &params.title).await?;
    Ok(Json(to_responses(rows)))
}

/// Rank a user's todo lists by completion percentage, highest first.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/todolists/progress",
    params(("user_id" = i64, Path, description = "Owner ID"), PageParams),
    responses(
        (status = 200, description = "Page of todo lists by progress", body = PaginatedResponse<TodoListResponse>),
        (status = 404, description = "User not found", body = AppError)
    ),
    tag = "todolists"
)]
#[tracing::instrument(skip(repos, paging))]
pub async fn todo_lists_by_progress(
    State(repos): State<Repositories>,
    State(paging): State<PaginationConfig>,
    Path(user_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Json<PaginatedResponse<TodoListResponse>>, AppError> {
    let page = page_request(&params, &paging)?;
    let (rows, total) = lists::find_by_completion_percentage(&repos, user_id, page).await?;
    Ok(Json(
        PaginatedResponse::new(rows, page.page, page.limit, total).map(TodoListResponse::from),
    ))
}

/// Count a user's todo lists.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/todolists/count",
    params(("user_id" = i64, Path, description = "Owner ID")),
    responses(
        (status = 200, description = "Number of todo lists", body = CountResponse),
        (status = 404, description = "User not found", body = AppError)
    ),
    tag = "todolists"
)]
#[tracing::instrument(skip(repos))]
pub async fn count_todo_lists(
    State(repos): State<Repositories>,
    Path(user_id): Path<i64>,
) -> Result<Json<CountResponse>, AppError> {
    let count = lists::count_by_user(&repos, user_id).await?;
    Ok(Json(CountResponse { count }))
}

/// Create a todo list owned by the user in the path.
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/todolists",
    params(("user_id" = i64, Path, description = "Owner ID")),
    request_body = CreateTodoListRequest,
    responses(
        (status = 201, description = "Todo list created", body = TodoListResponse),
        (status = 404, description = "User not found", body = AppError),
        (status = 422, description = "Validation failed", body = AppError)
    ),
    tag = "todolists"
)]
#[tracing::instrument(skip(repos))]
pub async fn create_todo_list(
    State(repos): State<Repositories>,
    Path(user_id): Path<i64>,
    Json(payload): Json<CreateTodoListRequest>,
) -> Result<(StatusCode, Json<TodoListResponse>), AppError> {
    payload.validate_request()?;
    let list = lists::create_todo_list(&repos, user_id, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(TodoListResponse::from(list))))
}

/// Delete every todo list of the user, with their tasks.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}/todolists",
    params(("user_id" = i64, Path, description = "Owner ID")),
    responses(
        (status = 204, description = "Todo lists deleted"),
        (status = 404, description = "User not found", body = AppError)
    ),
    tag = "todolists"
)]
#[tracing::instrument(skip(repos))]
pub async fn delete_all_todo_lists(
    State(repos): State<Repositories>,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    lists::delete_all_by_user(&repos, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get one of the user's todo lists.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/todolists/{list_id}",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("list_id" = i64, Path, description = "Todo list ID")
    ),
    responses(
        (status = 200, description = "Todo list found", body = TodoListResponse),
        (status = 404, description = "User or todo list not found", body = AppError)
    ),
    tag = "todolists"
)]
#[tracing::instrument(skip(repos))]
pub async fn get_todo_list(
    State(repos): State<Repositories>,
    Path((user_id, list_id)): Path<(i64, i64)>,
) -> Result<Json<TodoListResponse>, AppError> {
    let list = lists::find_by_id_and_user(&repos, list_id, user_id).await?;
    Ok(Json(TodoListResponse::from(list)))
}

/// Update the title and description of a todo list.
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/todolists/{list_id}",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("list_id" = i64, Path, description = "Todo list ID")
    ),
    request_body = UpdateTodoListRequest,
    responses(
        (status = 200, description = "Todo list updated", body = TodoListResponse),
        (status = 404, description = "User or todo list not found", body = AppError),
        (status = 409, description = "Stale version", body = AppError),
        (status = 422, description = "Validation failed", body = AppError)
    ),
    tag = "todolists"
)]
#[tracing::instrument(skip(repos))]
pub async fn update_todo_list(
    State(repos): State<Repositories>,
    Path((user_id, list_id)): Path<(i64, i64)>,
    Json(payload): Json<UpdateTodoListRequest>,
) -> Result<Json<TodoListResponse>, AppError> {
    payload.validate_request()?;
    let list = lists::update_todo_list(&repos, list_id, user_id, payload).await?;
    Ok(Json(TodoListResponse::from(list)))
}

/// Delete a todo list and all of its tasks.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}/todolists/{list_id}",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("list_id" = i64, Path, description = "Todo list ID")
    ),
    responses(
        (status = 204, description = "Todo list deleted"),
        (status = 404, description = "User or todo list not found", body = AppError)
    ),
    tag = "todolists"
)]
#[tracing::instrument(skip(repos))]
pub async fn delete_todo_list(
    State(repos): State<Repositories>,
    Path((user_id, list_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    lists::delete_todo_list(&repos, list_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
