use axum::Router;
use shared_types::{
    AppError, AppErrorKind, ChangePasswordRequest, CountResponse, CreateTodoListRequest,
    CreateTodoTaskRequest, ExistsResponse, PaginatedResponse, PaginationMeta,
    RegisterUserRequest, SetActiveRequest, SetDueDateRequest, SetPriorityRequest, SortDirection,
    SortField, TaskPriority, TodoListResponse, TodoTaskResponse, UpdateTodoListRequest,
    UpdateTodoTaskRequest, UpdateUserRequest, UserResponse,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::db::AppState;
use crate::health;
use crate::rest::{self, todo_list, todo_task, user};

/// OpenAPI documentation for the API.
#[derive(OpenApi)]
#[openapi(
    paths(
        // Users
        user::list_users,
        user::list_active_users,
        user::register_user,
        user::get_user,
        user::update_user,
        user::delete_user,
        user::get_user_by_username,
        user::get_user_by_email,
        user::username_exists,
        user::email_exists,
        user::set_user_active,
        user::change_password,
        // Todo lists
        todo_list::list_todo_lists,
        todo_list::list_all_todo_lists,
        todo_list::search_todo_lists,
        todo_list::todo_lists_by_progress,
        todo_list::count_todo_lists,
        todo_list::create_todo_list,
        todo_list::delete_all_todo_lists,
        todo_list::get_todo_list,
        todo_list::update_todo_list,
        todo_list::delete_todo_list,
        // Tasks
        todo_task::list_tasks,
        todo_task::list_tasks_paged,
        todo_task::tasks_by_status,
        todo_task::tasks_by_priority,
        todo_task::overdue_tasks,
        todo_task::search_tasks,
        todo_task::count_tasks,
        todo_task::count_completed_tasks,
        todo_task::create_task,
        todo_task::delete_all_tasks,
        todo_task::get_task,
        todo_task::update_task,
        todo_task::delete_task,
        todo_task::toggle_task,
        todo_task::set_task_priority,
        todo_task::set_task_due_date,
        todo_task::list_user_tasks,
        health::health_check,
    ),
    components(schemas(
        AppError, AppErrorKind,
        UserResponse, RegisterUserRequest, UpdateUserRequest, ChangePasswordRequest,
        SetActiveRequest,
        TodoListResponse, CreateTodoListRequest, UpdateTodoListRequest,
        TodoTaskResponse, CreateTodoTaskRequest, UpdateTodoTaskRequest, SetPriorityRequest,
        SetDueDateRequest, TaskPriority,
        PaginatedResponse<TodoListResponse>, PaginatedResponse<TodoTaskResponse>, PaginationMeta,
        SortField, SortDirection, CountResponse, ExistsResponse,
        health::HealthResponse,
    )),
    tags(
        (name = "users", description = "User directory"),
        (name = "todolists", description = "Todo lists owned by a user"),
        (name = "tasks", description = "Tasks inside a todo list"),
        (name = "health", description = "Health check endpoint")
    ),
    info(
        title = "Todo API",
        description = "Multi-tenant todo list service",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

/// Build the full application router: the REST API under `/api/v1`,
/// `/health`, and the API docs at `/docs`.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .merge(rest::api_router())
        .route("/health", axum::routing::get(health::health_check))
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
}
