use chrono::{DateTime, Utc};
use shared_types::{AppError, PageRequest, TaskFields, TaskPriority, TodoList, TodoTask};

use super::{expected_version, todo_list, user};
use crate::repo::{Repositories, TaskFilter};

fn task_not_found(task_id: i64) -> AppError {
    AppError::not_found(format!("Todo task {task_id} not found"))
}

async fn require_list(
    repos: &Repositories,
    list_id: i64,
    user_id: i64,
) -> Result<TodoList, AppError> {
    todo_list::find_by_id_and_user(repos, list_id, user_id).await
}

async fn list_tasks(
    repos: &Repositories,
    list_id: i64,
    user_id: i64,
    filter: TaskFilter,
) -> Result<Vec<TodoTask>, AppError> {
    require_list(repos, list_id, user_id).await?;
    repos.tasks.list_by_list(list_id, &filter).await
}

/// Load the task through the full ownership chain, then write `fields` back
/// conditioned on the version that was read.
async fn rewrite_task(
    repos: &Repositories,
    task_id: i64,
    list_id: i64,
    user_id: i64,
    requested_version: Option<i32>,
    change: impl FnOnce(&mut TaskFields),
) -> Result<TodoTask, AppError> {
    let current = find_by_id_and_todo_list_and_user(repos, task_id, list_id, user_id).await?;
    let version = expected_version(requested_version, current.version);

    let mut fields = TaskFields::from(&current);
    change(&mut fields);

    repos
        .tasks
        .update(task_id, list_id, version, &fields)
        .await?
        .ok_or_else(|| AppError::stale_version("Todo task", task_id))
}

pub async fn find_by_id_and_todo_list_and_user(
    repos: &Repositories,
    task_id: i64,
    list_id: i64,
    user_id: i64,
) -> Result<TodoTask, AppError> {
    require_list(repos, list_id, user_id).await?;
    repos
        .tasks
        .find_by_id_and_list(task_id, list_id)
        .await?
        .ok_or_else(|| task_not_found(task_id))
}

pub async fn find_all_by_todo_list(
    repos: &Repositories,
    list_id: i64,
    user_id: i64,
) -> Result<Vec<TodoTask>, AppError> {
    list_tasks(repos, list_id, user_id, TaskFilter::All).await
}

pub async fn find_all_by_todo_list_paged(
    repos: &Repositories,
    list_id: i64,
    user_id: i64,
    page: PageRequest,
) -> Result<(Vec<TodoTask>, i64), AppError> {
    require_list(repos, list_id, user_id).await?;
    repos.tasks.page_by_list(list_id, page).await
}

pub async fn find_by_completion_status(
    repos: &Repositories,
    list_id: i64,
    user_id: i64,
    completed: bool,
) -> Result<Vec<TodoTask>, AppError> {
    list_tasks(repos, list_id, user_id, TaskFilter::Completed(completed)).await
}

pub async fn find_by_priority(
    repos: &Repositories,
    list_id: i64,
    user_id: i64,
    priority: TaskPriority,
) -> Result<Vec<TodoTask>, AppError> {
    list_tasks(repos, list_id, user_id, TaskFilter::Priority(priority)).await
}

/// Incomplete tasks whose due date has already passed.
pub async fn find_overdue_tasks(
    repos: &Repositories,
    list_id: i64,
    user_id: i64,
) -> Result<Vec<TodoTask>, AppError> {
    list_tasks(repos, list_id, user_id, TaskFilter::OverdueAt(Utc::now())).await
}

pub async fn find_by_title_containing(
    repos: &Repositories,
    list_id: i64,
    user_id: i64,
    title: &str,
) -> Result<Vec<TodoTask>, AppError> {
    list_tasks(
        repos,
        list_id,
        user_id,
        TaskFilter::TitleContains(title.to_string()),
    )
    .await
}

/// Every task of every list the user owns.
pub async fn find_all_tasks_by_user(
    repos: &Repositories,
    user_id: i64,
) -> Result<Vec<TodoTask>, AppError> {
    user::get_by_id(repos, user_id).await?;
    repos.tasks.list_by_owner(user_id).await
}

pub async fn count_tasks_in_todo_list(
    repos: &Repositories,
    list_id: i64,
    user_id: i64,
) -> Result<i64, AppError> {
    require_list(repos, list_id, user_id).await?;
    repos.tasks.count_by_list(list_id, None).await
}

pub async fn count_completed_tasks_in_todo_list(
    repos: &Repositories,
    list_id: i64,
    user_id: i64,
) -> Result<i64, AppError> {
    require_list(repos, list_id, user_id).await?;
    repos.tasks.count_by_list(list_id, Some(true)).await
}

/// Add a task to the list. A due date, when given, must lie in the future.
pub async fn create_task(
    repos: &Repositories,
    list_id: i64,
    user_id: i64,
    fields: TaskFields,
) -> Result<TodoTask, AppError> {
    if fields.due_date.is_some_and(|due| due <= Utc::now()) {
        return Err(AppError::invalid_field(
            "due_date",
            "Due date must be in the future",
        ));
    }

    require_list(repos, list_id, user_id).await?;
    let task = repos.tasks.insert(list_id, &fields).await?;
    tracing::info!(user_id, list_id, task_id = task.id, "todo task created");
    Ok(task)
}

/// Replace every editable field of the task.
pub async fn update_task(
    repos: &Repositories,
    task_id: i64,
    list_id: i64,
    user_id: i64,
    fields: TaskFields,
    version: Option<i32>,
) -> Result<TodoTask, AppError> {
    rewrite_task(repos, task_id, list_id, user_id, version, |current| {
        *current = fields;
    })
    .await
}

pub async fn toggle_task_completion(
    repos: &Repositories,
    task_id: i64,
    list_id: i64,
    user_id: i64,
) -> Result<TodoTask, AppError> {
    rewrite_task(repos, task_id, list_id, user_id, None, |current| {
        current.completed = !current.completed;
    })
    .await
}

pub async fn update_task_priority(
    repos: &Repositories,
    task_id: i64,
    list_id: i64,
    user_id: i64,
    priority: TaskPriority,
) -> Result<TodoTask, AppError> {
    rewrite_task(repos, task_id, list_id, user_id, None, |current| {
        current.priority = priority;
    })
    .await
}

/// Set or clear the due date.
pub async fn update_task_due_date(
    repos: &Repositories,
    task_id: i64,
    list_id: i64,
    user_id: i64,
    due_date: Option<DateTime<Utc>>,
) -> Result<TodoTask, AppError> {
    rewrite_task(repos, task_id, list_id, user_id, None, |current| {
        current.due_date = due_date;
    })
    .await
}

pub async fn delete_task(
    repos: &Repositories,
    task_id: i64,
    list_id: i64,
    user_id: i64,
) -> Result<(), AppError> {
    require_list(repos, list_id, user_id).await?;
    if !repos.tasks.delete(task_id, list_id).await? {
        return Err(task_not_found(task_id));
    }
    tracing::info!(user_id, list_id, task_id, "todo task deleted");
    Ok(())
}

/// Empty the list. Returns how many tasks were removed.
pub async fn delete_all_tasks_in_todo_list(
    repos: &Repositories,
    list_id: i64,
    user_id: i64,
) -> Result<u64, AppError> {
    require_list(repos, list_id, user_id).await?;
    repos.tasks.delete_by_list(list_id).await
}
