use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared_types::{
    AppError, CompletionParams, CountResponse, CreateTodoTaskRequest, PageParams,
    PaginatedResponse, PaginationConfig, SetDueDateRequest, SetPriorityRequest, TaskPriority,
    TitleSearchParams, TodoTask, TodoTaskResponse, UpdateTodoTaskRequest,
};

use super::page_request;
use crate::error_convert::ValidateRequest;
use crate::repo::Repositories;
use crate::service::todo_task as tasks;

fn to_responses(tasks: Vec<TodoTask>) -> Vec<TodoTaskResponse> {
    tasks.into_iter().map(TodoTaskResponse::from).collect()
}

/// List every task in a todo list.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/todolists/{list_id}/tasks",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("list_id" = i64, Path, description = "Todo list ID")
    ),
    responses(
        (status = 200, description = "Tasks in the list", body = Vec<TodoTaskResponse>),
        (status = 404, description = "User or todo list not found", body = AppError)
    ),
    tag = "tasks"
)]
#[tracing::instrument(skip(repos))]
pub async fn list_tasks(
    State(repos): State<Repositories>,
    Path((user_id, list_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<TodoTaskResponse>>, AppError> {
    let rows = tasks::find_all_by_todo_list(&repos, list_id, user_id).await?;
    Ok(Json(to_responses(rows)))
}

/// List the tasks of a todo list, one page at a time.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/todolists/{list_id}/tasks/paged",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("list_id" = i64, Path, description = "Todo list ID"),
        PageParams
    ),
    responses(
        (status = 200, description = "Page of tasks", body = PaginatedResponse<TodoTaskResponse>),
        (status = 400, description = "Unknown sort field or direction", body = AppError),
        (status = 404, description = "User or todo list not found", body = AppError)
    ),
    tag = "tasks"
)]
#[tracing::instrument(skip(repos, paging))]
pub async fn list_tasks_paged(
    State(repos): State<Repositories>,
    State(paging): State<PaginationConfig>,
    Path((user_id, list_id)): Path<(i64, i64)>,
    Query(params): Query<PageParams>,
) -> Result<Json<PaginatedResponse<TodoTaskResponse>>, AppError> {
    let page = page_request(&params, &paging)?;
    let (rows, total) = tasks::find_all_by_todo_list_paged(&repos, list_id, user_id, page).await?;
    Ok(Json(
        PaginatedResponse::new(rows, page.page, page.limit, total).map(TodoTaskResponse::from),
    ))
}

/// List tasks by completion status.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/todolists/{list_id}/tasks/status",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("list_id" = i64, Path, description = "Todo list ID"),
        CompletionParams
    ),
    responses(
        (status = 200, description = "Matching tasks", body = Vec<TodoTaskResponse>),
        (status = 404, description = "User or todo list not found", body = AppError)
    ),
    tag = "tasks"
)]
#[tracing::instrument(skip(repos))]
pub async fn tasks_by_status(
    State(repos): State<Repositories>,
    Path((user_id, list_id)): Path<(i64, i64)>,
    Query(params): Query<CompletionParams>,
) -> Result<Json<Vec<TodoTaskResponse>>, AppError> {
    let rows = tasks::find_by_completion_status(&repos, list_id, user_id, params.completed).await?;
    Ok(Json(to_responses(rows)))
}

/// List tasks with the given priority.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/todolists/{list_id}/tasks/priority/{priority}",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("list_id" = i64, Path, description = "Todo list ID"),
        ("priority" = String, Path, description = "LOW, MEDIUM, HIGH or URGENT (any case)")
    ),
    responses(
        (status = 200, description = "Matching tasks", body = Vec<TodoTaskResponse>),
        (status = 400, description = "Unknown priority", body = AppError),
        (status = 404, description = "User or todo list not found", body = AppError)
    ),
    tag = "tasks"
)]
#[tracing::instrument(skip(repos))]
pub async fn tasks_by_priority(
    State(repos): State<Repositories>,
    Path((user_id, list_id, priority)): Path<(i64, i64, String)>,
) -> Result<Json<Vec<TodoTaskResponse>>, AppError> {
    let priority = TaskPriority::from_str_opt(&priority)
        .ok_or_else(|| AppError::bad_request(format!("Unknown task priority: {priority}")))?;
    let rows = tasks::find_by_priority(&repos, list_id, user_id, priority).await?;
    Ok(Json(to_responses(rows)))
}

/// List incomplete tasks whose due date has passed.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/todolists/{list_id}/tasks/overdue",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("list_id" = i64, Path, description = "Todo list ID")
    ),
    responses(
        (status = 200, description = "Overdue tasks", body = Vec<TodoTaskResponse>),
        (status = 404, description = "User or todo list not found", body = AppError)
    ),
    tag = "tasks"
)]
#[tracing::instrument(skip(repos))]
pub async fn overdue_tasks(
    State(repos): State<Repositories>,
    Path((user_id, list_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<TodoTaskResponse>>, AppError> {
    let rows = tasks::find_overdue_tasks(&repos, list_id, user_id).await?;
    Ok(Json(to_responses(rows)))
}

/// Find tasks whose title contains the given text, ignoring case.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/todolists/{list_id}/tasks/search",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("list_id" = i64, Path, description = "Todo list ID"),
        TitleSearchParams
    ),
    responses(
        (status = 200, description = "Matching tasks", body = Vec<TodoTaskResponse>),
        (status = 404, description = "User or todo list not found", body = AppError)
    ),
    tag = "tasks"
)]
#[tracing::instrument(skip(repos))]
pub async fn search_tasks(
    State(repos): State<Repositories>,
    Path((user_id, list_id)): Path<(i64, i64)>,
    Query(params): Query<TitleSearchParams>,
) -> Result<Json<Vec<TodoTaskResponse>>, AppError> {
    let rows = tasks::find_by_title_containing(&repos, list_id, user_id, &params.title).await?;
    Ok(Json(to_responses(rows)))
}

/// Count the tasks in a todo list.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/todolists/{list_id}/tasks/count",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("list_id" = i64, Path, description = "Todo list ID")
    ),
    responses(
        (status = 200, description = "Number of tasks", body = CountResponse),
        (status = 404, description = "User or todo list not found", body = AppError)
    ),
    tag = "tasks"
)]
#[tracing::instrument(skip(repos))]
pub async fn count_tasks(
    State(repos): State<Repositories>,
    Path((user_id, list_id)): Path<(i64, i64)>,
) -> Result<Json<CountResponse>, AppError> {
    let count = tasks::count_tasks_in_todo_list(&repos, list_id, user_id).await?;
    Ok(Json(CountResponse { count }))
}

/// Count the completed tasks in a todo list.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/todolists/{list_id}/tasks/count/completed",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("list_id" = i64, Path, description = "Todo list ID")
    ),
    responses(
        (status = 200, description = "Number of completed tasks", body = CountResponse),
        (status = 404, description = "User or todo list not found", body = AppError)
    ),
    tag = "tasks"
)]
#[tracing::instrument(skip(repos))]
pub async fn count_completed_tasks(
    State(repos): State<Repositories>,
    Path((user_id, list_id)): Path<(i64, i64)>,
) -> Result<Json<CountResponse>, AppError> {
    let count = tasks::count_completed_tasks_in_todo_list(&repos, list_id, user_id).await?;
    Ok(Json(CountResponse { count }))
}

/// Add a task to a todo list.
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/todolists/{list_id}/tasks",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("list_id" = i64, Path, description = "Todo list ID")
    ),
    request_body = CreateTodoTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TodoTaskResponse),
        (status = 404, description = "User or todo list not found", body = AppError),
        (status = 422, description = "Validation failed", body = AppError)
    ),
    tag = "tasks"
)]
#[tracing::instrument(skip(repos))]
pub async fn create_task(
    State(repos): State<Repositories>,
    Path((user_id, list_id)): Path<(i64, i64)>,
    Json(payload): Json<CreateTodoTaskRequest>,
) -> Result<(StatusCode, Json<TodoTaskResponse>), AppError> {
    payload.validate_request()?;
    let task = tasks::create_task(&repos, list_id, user_id, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(TodoTaskResponse::from(task))))
}

/// Delete every task in a todo list. The list itself stays.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}/todolists/{list_id}/tasks",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("list_id" = i64, Path, description = "Todo list ID")
    ),
    responses(
        (status = 204, description = "Tasks deleted"),
        (status = 404, description = "User or todo list not found", body = AppError)
    ),
    tag = "tasks"
)]
#[tracing::instrument(skip(repos))]
pub async fn delete_all_tasks(
    State(repos): State<Repositories>,
    Path((user_id, list_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    tasks::delete_all_tasks_in_todo_list(&repos, list_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get one task.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/todolists/{list_id}/tasks/{task_id}",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("list_id" = i64, Path, description = "Todo list ID"),
        ("task_id" = i64, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task found", body = TodoTaskResponse),
        (status = 404, description = "User, todo list or task not found", body = AppError)
    ),
    tag = "tasks"
)]
#[tracing::instrument(skip(repos))]
pub async fn get_task(
    State(repos): State<Repositories>,
    Path((user_id, list_id, task_id)): Path<(i64, i64, i64)>,
) -> Result<Json<TodoTaskResponse>, AppError> {
    let task = tasks::find_by_id_and_todo_list_and_user(&repos, task_id, list_id, user_id).await?;
    Ok(Json(TodoTaskResponse::from(task)))
}

/// Replace every editable field of a task.
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/todolists/{list_id}/tasks/{task_id}",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("list_id" = i64, Path, description = "Todo list ID"),
        ("task_id" = i64, Path, description = "Task ID")
    ),
    request_body = UpdateTodoTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = TodoTaskResponse),
        (status = 404, description = "User, todo list or task not found", body = AppError),
        (status = 409, description = "Stale version", body = AppError),
        (status = 422, description = "Validation failed", body = AppError)
    ),
    tag = "tasks"
)]
#[tracing::instrument(skip(repos))]
pub async fn update_task(
    State(repos): State<Repositories>,
    Path((user_id, list_id, task_id)): Path<(i64, i64, i64)>,
    Json(payload): Json<UpdateTodoTaskRequest>,
) -> Result<Json<TodoTaskResponse>, AppError> {
    payload.validate_request()?;
    let task = tasks::update_task(
        &repos,
        task_id,
        list_id,
        user_id,
        payload.fields(),
        payload.version,
    )
    .await?;
    Ok(Json(TodoTaskResponse::from(task)))
}

/// Delete one task.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}/todolists/{list_id}/tasks/{task_id}",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("list_id" = i64, Path, description = "Todo list ID"),
        ("task_id" = i64, Path, description = "Task ID")
    ),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "User, todo list or task not found", body = AppError)
    ),
    tag = "tasks"
)]
#[tracing::instrument(skip(repos))]
pub async fn delete_task(
    State(repos): State<Repositories>,
    Path((user_id, list_id, task_id)): Path<(i64, i64, i64)>,
) -> Result<StatusCode, AppError> {
    tasks::delete_task(&repos, task_id, list_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Flip a task between completed and pending.
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/todolists/{list_id}/tasks/{task_id}/toggle",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("list_id" = i64, Path, description = "Todo list ID"),
        ("task_id" = i64, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task toggled", body = TodoTaskResponse),
        (status = 404, description = "User, todo list or task not found", body = AppError)
    ),
    tag = "tasks"
)]
#[tracing::instrument(skip(repos))]
pub async fn toggle_task(
    State(repos): State<Repositories>,
    Path((user_id, list_id, task_id)): Path<(i64, i64, i64)>,
) -> Result<Json<TodoTaskResponse>, AppError> {
    let task = tasks::toggle_task_completion(&repos, task_id, list_id, user_id).await?;
    Ok(Json(TodoTaskResponse::from(task)))
}

/// Change only the priority of a task.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{user_id}/todolists/{list_id}/tasks/{task_id}/priority",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("list_id" = i64, Path, description = "Todo list ID"),
        ("task_id" = i64, Path, description = "Task ID")
    ),
    request_body = SetPriorityRequest,
    responses(
        (status = 200, description = "Priority updated", body = TodoTaskResponse),
        (status = 404, description = "User, todo list or task not found", body = AppError)
    ),
    tag = "tasks"
)]
#[tracing::instrument(skip(repos))]
pub async fn set_task_priority(
    State(repos): State<Repositories>,
    Path((user_id, list_id, task_id)): Path<(i64, i64, i64)>,
    Json(payload): Json<SetPriorityRequest>,
) -> Result<Json<TodoTaskResponse>, AppError> {
    let task =
        tasks::update_task_priority(&repos, task_id, list_id, user_id, payload.priority).await?;
    Ok(Json(TodoTaskResponse::from(task)))
}

/// Set or clear the due date of a task.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{user_id}/todolists/{list_id}/tasks/{task_id}/due-date",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("list_id" = i64, Path, description = "Todo list ID"),
        ("task_id" = i64, Path, description = "Task ID")
    ),
    request_body = SetDueDateRequest,
    responses(
        (status = 200, description = "Due date updated", body = TodoTaskResponse),
        (status = 404, description = "User, todo list or task not found", body = AppError)
    ),
    tag = "tasks"
)]
#[tracing::instrument(skip(repos))]
pub async fn set_task_due_date(
    State(repos): State<Repositories>,
    Path((user_id, list_id, task_id)): Path<(i64, i64, i64)>,
    Json(payload): Json<SetDueDateRequest>,
) -> Result<Json<TodoTaskResponse>, AppError> {
    let task =
        tasks::update_task_due_date(&repos, task_id, list_id, user_id, payload.due_date).await?;
    Ok(Json(TodoTaskResponse::from(task)))
}

/// List every task across all of the user's todo lists.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/tasks",
    params(("user_id" = i64, Path, description = "Owner ID")),
    responses(
        (status = 200, description = "All of the user's tasks", body = Vec<TodoTaskResponse>),
        (status = 404, description = "User not found", body = AppError)
    ),
    tag = "tasks"
)]
#[tracing::instrument(skip(repos))]
pub async fn list_user_tasks(
    State(repos): State<Repositories>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<TodoTaskResponse>>, AppError> {
    let rows = tasks::find_all_tasks_by_user(&repos, user_id).await?;
    Ok(Json(to_responses(rows)))
}
