pub mod todo_list;
pub mod todo_task;
pub mod user;

use axum::{
    routing::{get, patch, post},
    Router,
};
use shared_types::{
    normalize_pagination, AppError, PageParams, PageRequest, PaginationConfig, SortDirection,
    SortField,
};

use crate::db::AppState;

/// Turn raw paging query parameters into a normalized page request.
/// Unknown sort fields or directions are a bad request.
pub fn page_request(params: &PageParams, paging: &PaginationConfig) -> Result<PageRequest, AppError> {
    let (page, limit) = normalize_pagination(params.page, params.limit, paging.default_limit);
    let mut request = PageRequest::new(page, limit);

    if let Some(sort) = params.sort.as_deref() {
        request.sort = SortField::from_str_opt(sort)
            .ok_or_else(|| AppError::bad_request(format!("Unknown sort field: {sort}")))?;
    }
    if let Some(direction) = params.direction.as_deref() {
        request.direction = SortDirection::from_str_opt(direction).ok_or_else(|| {
            AppError::bad_request(format!("Unknown sort direction: {direction}"))
        })?;
    }

    Ok(request)
}

/// Build the versioned REST API router.
pub fn api_router() -> Router<AppState> {
    const LISTS: &str = "/api/v1/users/{user_id}/todolists";
    const TASKS: &str = "/api/v1/users/{user_id}/todolists/{list_id}/tasks";

    Router::new()
        // Users
        .route("/api/v1/users", get(user::list_users).post(user::register_user))
        .route("/api/v1/users/active", get(user::list_active_users))
        .route(
            "/api/v1/users/{id}",
            get(user::get_user).put(user::update_user).delete(user::delete_user),
        )
        .route("/api/v1/users/{id}/active", patch(user::set_user_active))
        .route("/api/v1/users/{id}/password", patch(user::change_password))
        .route("/api/v1/users/username/{username}", get(user::get_user_by_username))
        .route("/api/v1/users/username/{username}/exists", get(user::username_exists))
        .route("/api/v1/users/email/{email}", get(user::get_user_by_email))
        .route("/api/v1/users/email/{email}/exists", get(user::email_exists))
        // Todo lists
        .route(
            LISTS,
            get(todo_list::list_todo_lists)
                .post(todo_list::create_todo_list)
                .delete(todo_list::delete_all_todo_lists),
        )
        .route(&format!("{LISTS}/all"), get(todo_list::list_all_todo_lists))
        .route(&format!("{LISTS}/search"), get(todo_list::search_todo_lists))
        .route(&format!("{LISTS}/progress"), get(todo_list::todo_lists_by_progress))
        .route(&format!("{LISTS}/count"), get(todo_list::count_todo_lists))
        .route(
            &format!("{LISTS}/{{list_id}}"),
            get(todo_list::get_todo_list)
                .put(todo_list::update_todo_list)
                .delete(todo_list::delete_todo_list),
        )
        // Tasks
        .route(
            TASKS,
            get(todo_task::list_tasks)
                .post(todo_task::create_task)
                .delete(todo_task::delete_all_tasks),
        )
        .route(&format!("{TASKS}/paged"), get(todo_task::list_tasks_paged))
        .route(&format!("{TASKS}/status"), get(todo_task::tasks_by_status))
        .route(&format!("{TASKS}/priority/{{priority}}"), get(todo_task::tasks_by_priority))
        .route(&format!("{TASKS}/overdue"), get(todo_task::overdue_tasks))
        .route(&format!("{TASKS}/search"), get(todo_task::search_tasks))
        .route(&format!("{TASKS}/count"), get(todo_task::count_tasks))
        .route(&format!("{TASKS}/count/completed"), get(todo_task::count_completed_tasks))
        .route(
            &format!("{TASKS}/{{task_id}}"),
            get(todo_task::get_task)
                .put(todo_task::update_task)
                .delete(todo_task::delete_task),
        )
        .route(&format!("{TASKS}/{{task_id}}/toggle"), post(todo_task::toggle_task))
        .route(&format!("{TASKS}/{{task_id}}/priority"), patch(todo_task::set_task_priority))
        .route(&format!("{TASKS}/{{task_id}}/due-date"), patch(todo_task::set_task_due_date))
        // Cross-list
        .route("/api/v1/users/{user_id}/tasks", get(todo_task::list_user_tasks))
}
