use async_trait::async_trait;
use shared_types::{AppError, PageRequest, SortField, TaskFields, TodoTask};

use super::{like_pattern, PgStore, TaskFilter, TodoTaskRepository};
use crate::error_convert::SqlxErrorExt;

const TASK_COLUMNS: &str = "id, todo_list_id, title, description, completed, due_date, \
                            priority, version, created_at, updated_at";

const PRIORITY_RANK: &str =
    "CASE priority WHEN 'LOW' THEN 0 WHEN 'MEDIUM' THEN 1 WHEN 'HIGH' THEN 2 ELSE 3 END";

fn task_order_by(page: &PageRequest) -> String {
    let dir = page.direction.as_sql();
    match page.sort {
        SortField::Id => format!("id {dir}"),
        SortField::Title => format!("title {dir}, id {dir}"),
        SortField::CreatedAt => format!("created_at {dir}, id {dir}"),
        SortField::UpdatedAt => format!("updated_at {dir}, id {dir}"),
        SortField::DueDate => format!("due_date {dir} NULLS LAST, id {dir}"),
        SortField::Priority => format!("{PRIORITY_RANK} {dir}, id {dir}"),
    }
}

#[async_trait]
impl TodoTaskRepository for PgStore {
    async fn find_by_id_and_list(
        &self,
        id: i64,
        list_id: i64,
    ) -> Result<Option<TodoTask>, AppError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM todo_tasks WHERE id = $1 AND todo_list_id = $2");
        sqlx::query_as::<_, TodoTask>(&sql)
            .bind(id)
            .bind(list_id)
            .fetch_optional(self.pool())
            .await
            .map_err(SqlxErrorExt::into_app_error)
    }

    async fn list_by_list(
        &self,
        list_id: i64,
        filter: &TaskFilter,
    ) -> Result<Vec<TodoTask>, AppError> {
        let base = format!("SELECT {TASK_COLUMNS} FROM todo_tasks WHERE todo_list_id = $1");
        let rows = match filter {
            TaskFilter::All => {
                let sql = format!("{base} ORDER BY id");
                sqlx::query_as::<_, TodoTask>(&sql)
                    .bind(list_id)
                    .fetch_all(self.pool())
                    .await
            }
            TaskFilter::Completed(completed) => {
                let sql = format!("{base} AND completed = $2 ORDER BY id");
                sqlx::query_as::<_, TodoTask>(&sql)
                    .bind(list_id)
                    .bind(*completed)
                    .fetch_all(self.pool())
                    .await
            }
            TaskFilter::Priority(priority) => {
                let sql = format!("{base} AND priority = $2 ORDER BY id");
                sqlx::query_as::<_, TodoTask>(&sql)
                    .bind(list_id)
                    .bind(priority.as_str())
                    .fetch_all(self.pool())
                    .await
            }
            TaskFilter::OverdueAt(now) => {
                let sql = format!(
                    "{base} AND completed = FALSE AND due_date IS NOT NULL AND due_date < $2 \
                     ORDER BY due_date, id"
                );
                sqlx::query_as::<_, TodoTask>(&sql)
                    .bind(list_id)
                    .bind(*now)
                    .fetch_all(self.pool())
                    .await
            }
            TaskFilter::TitleContains(title) => {
                let sql = format!(r"{base} AND title ILIKE $2 ESCAPE '\' ORDER BY id");
                sqlx::query_as::<_, TodoTask>(&sql)
                    .bind(list_id)
                    .bind(like_pattern(title))
                    .fetch_all(self.pool())
                    .await
            }
        };

        rows.map_err(SqlxErrorExt::into_app_error)
    }

    async fn page_by_list(
        &self,
        list_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<TodoTask>, i64), AppError> {
        let total = self.count_by_list(list_id, None).await?;

        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM todo_tasks WHERE todo_list_id = $1 \
             ORDER BY {} LIMIT $2 OFFSET $3",
            task_order_by(&page)
        );
        let rows = sqlx::query_as::<_, TodoTask>(&sql)
            .bind(list_id)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(self.pool())
            .await
            .map_err(SqlxErrorExt::into_app_error)?;

        Ok((rows, total))
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<TodoTask>, AppError> {
        sqlx::query_as::<_, TodoTask>(
            r#"
            SELECT t.id, t.todo_list_id, t.title, t.description, t.completed, t.due_date,
                   t.priority, t.version, t.created_at, t.updated_at
            FROM todo_tasks t
            JOIN todo_lists l ON l.id = t.todo_list_id
            WHERE l.owner_id = $1
            ORDER BY t.todo_list_id, t.id
            "#,
        )
        .bind(owner_id)
        .fetch_all(self.pool())
        .await
        .map_err(SqlxErrorExt::into_app_error)
    }

    async fn count_by_list(&self, list_id: i64, completed: Option<bool>) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM todo_tasks
            WHERE todo_list_id = $1 AND ($2::BOOLEAN IS NULL OR completed = $2)
            "#,
        )
        .bind(list_id)
        .bind(completed)
        .fetch_one(self.pool())
        .await
        .map_err(SqlxErrorExt::into_app_error)
    }

    async fn insert(&self, list_id: i64, fields: &TaskFields) -> Result<TodoTask, AppError> {
        let sql = format!(
            r#"
            INSERT INTO todo_tasks (todo_list_id, title, description, completed, due_date, priority)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TASK_COLUMNS}
            "#
        );
        sqlx::query_as::<_, TodoTask>(&sql)
            .bind(list_id)
            .bind(&fields.title)
            .bind(fields.description.as_deref())
            .bind(fields.completed)
            .bind(fields.due_date)
            .bind(fields.priority.as_str())
            .fetch_one(self.pool())
            .await
            .map_err(|e| {
                e.into_app_error_or_missing(|| {
                    AppError::not_found(format!("Todo list {list_id} not found"))
                })
            })
    }

    async fn update(
        &self,
        id: i64,
        list_id: i64,
        expected_version: i32,
        fields: &TaskFields,
    ) -> Result<Option<TodoTask>, AppError> {
        let sql = format!(
            r#"
            UPDATE todo_tasks SET
                title = $4,
                description = $5,
                completed = $6,
                due_date = $7,
                priority = $8,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND todo_list_id = $2 AND version = $3
            RETURNING {TASK_COLUMNS}
            "#
        );
        sqlx::query_as::<_, TodoTask>(&sql)
            .bind(id)
            .bind(list_id)
            .bind(expected_version)
            .bind(&fields.title)
            .bind(fields.description.as_deref())
            .bind(fields.completed)
            .bind(fields.due_date)
            .bind(fields.priority.as_str())
            .fetch_optional(self.pool())
            .await
            .map_err(SqlxErrorExt::into_app_error)
    }

    async fn delete(&self, id: i64, list_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM todo_tasks WHERE id = $1 AND todo_list_id = $2")
            .bind(id)
            .bind(list_id)
            .execute(self.pool())
            .await
            .map_err(SqlxErrorExt::into_app_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_list(&self, list_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM todo_tasks WHERE todo_list_id = $1")
            .bind(list_id)
            .execute(self.pool())
            .await
            .map_err(SqlxErrorExt::into_app_error)?;

        Ok(result.rows_affected())
    }
}
