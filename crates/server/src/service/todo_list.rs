use shared_types::{AppError, ListFields, PageRequest, TodoList, UpdateTodoListRequest, User};

use super::{expected_version, user};
use crate::repo::Repositories;

async fn require_user(repos: &Repositories, user_id: i64) -> Result<User, AppError> {
    user::get_by_id(repos, user_id).await
}

fn list_not_found(list_id: i64) -> AppError {
    AppError::not_found(format!("Todo list {list_id} not found"))
}

fn ensure_list_sort(page: &PageRequest) -> Result<(), AppError> {
    if !page.sort.applies_to_lists() {
        return Err(AppError::bad_request(format!(
            "Todo lists cannot be sorted by {}",
            page.sort.as_str()
        )));
    }
    Ok(())
}

/// The list, if it exists and belongs to the user. A list owned by someone
/// else yields the same NotFound as a missing one.
pub async fn find_by_id_and_user(
    repos: &Repositories,
    list_id: i64,
    user_id: i64,
) -> Result<TodoList, AppError> {
    require_user(repos, user_id).await?;
    repos
        .lists
        .find_by_id_and_owner(list_id, user_id)
        .await?
        .ok_or_else(|| list_not_found(list_id))
}

pub async fn find_all_by_user(repos: &Repositories, user_id: i64) -> Result<Vec<TodoList>, AppError> {
    require_user(repos, user_id).await?;
    repos.lists.list_by_owner(user_id).await
}

pub async fn find_all_by_user_paged(
    repos: &Repositories,
    user_id: i64,
    page: PageRequest,
) -> Result<(Vec<TodoList>, i64), AppError> {
    ensure_list_sort(&page)?;
    require_user(repos, user_id).await?;
    repos.lists.page_by_owner(user_id, page).await
}

pub async fn find_by_title_containing(
    repos: &Repositories,
    user_id: i64,
    title: &str,
) -> Result<Vec<TodoList>, AppError> {
    require_user(repos, user_id).await?;
    repos.lists.search_by_title(user_id, title).await
}

/// Lists ordered by completion percentage, most complete first.
pub async fn find_by_completion_percentage(
    repos: &Repositories,
    user_id: i64,
    page: PageRequest,
) -> Result<(Vec<TodoList>, i64), AppError> {
    require_user(repos, user_id).await?;
    repos.lists.page_by_progress(user_id, page).await
}

pub async fn count_by_user(repos: &Repositories, user_id: i64) -> Result<i64, AppError> {
    require_user(repos, user_id).await?;
    repos.lists.count_by_owner(user_id).await
}

/// Create a list owned by `user_id`.
pub async fn create_todo_list(
    repos: &Repositories,
    user_id: i64,
    fields: ListFields,
) -> Result<TodoList, AppError> {
    require_user(repos, user_id).await?;
    let list = repos.lists.insert(user_id, &fields).await?;
    tracing::info!(user_id, list_id = list.id, "todo list created");
    Ok(list)
}

/// Change title and description. The owner is never reassigned.
pub async fn update_todo_list(
    repos: &Repositories,
    list_id: i64,
    user_id: i64,
    req: UpdateTodoListRequest,
) -> Result<TodoList, AppError> {
    let current = find_by_id_and_user(repos, list_id, user_id).await?;
    let version = expected_version(req.version, current.version);
    let fields = ListFields {
        title: req.title,
        description: req.description,
    };

    repos
        .lists
        .update(list_id, user_id, version, &fields)
        .await?
        .ok_or_else(|| AppError::stale_version("Todo list", list_id))
}

/// Delete the list together with all of its tasks.
pub async fn delete_todo_list(
    repos: &Repositories,
    list_id: i64,
    user_id: i64,
) -> Result<(), AppError> {
    find_by_id_and_user(repos, list_id, user_id).await?;
    if !repos.lists.delete_with_tasks(list_id, user_id).await? {
        return Err(list_not_found(list_id));
    }
    tracing::info!(user_id, list_id, "todo list deleted");
    Ok(())
}

/// Delete every list of the user and their tasks. Returns how many lists went.
pub async fn delete_all_by_user(repos: &Repositories, user_id: i64) -> Result<u64, AppError> {
    require_user(repos, user_id).await?;
    let removed = repos.lists.delete_all_by_owner(user_id).await?;
    tracing::info!(user_id, removed, "todo lists deleted");
    Ok(removed)
}
