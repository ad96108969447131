use async_trait::async_trait;
use shared_types::{AppError, ListFields, PageRequest, SortField, TodoList};

use super::{like_pattern, PgStore, TodoListRepository};
use crate::error_convert::SqlxErrorExt;

/// Lists joined with their owner's username and task counters.
/// Callers append a WHERE clause, then `LIST_GROUP_BY` and an ORDER BY.
const LIST_SELECT: &str = r#"
    SELECT l.id, l.owner_id, u.username AS owner_username, l.title, l.description,
           l.version, l.created_at, l.updated_at,
           COUNT(t.id) AS task_count,
           COUNT(t.id) FILTER (WHERE t.completed) AS completed_count
    FROM todo_lists l
    JOIN users u ON u.id = l.owner_id
    LEFT JOIN todo_tasks t ON t.todo_list_id = l.id
"#;

const LIST_GROUP_BY: &str = "GROUP BY l.id, u.username";

const PROGRESS_ORDER: &str = "CASE WHEN COUNT(t.id) = 0 THEN 0 \
     ELSE (COUNT(t.id) FILTER (WHERE t.completed)) * 100 / COUNT(t.id) END DESC, l.id ASC";

fn list_order_by(page: &PageRequest) -> String {
    let column = match page.sort {
        SortField::Title => "l.title",
        SortField::UpdatedAt => "l.updated_at",
        SortField::Id => "l.id",
        // Lists carry no due date or priority; the service rejects those earlier.
        SortField::CreatedAt | SortField::DueDate | SortField::Priority => "l.created_at",
    };
    let dir = page.direction.as_sql();
    format!("{column} {dir}, l.id {dir}")
}

#[async_trait]
impl TodoListRepository for PgStore {
    async fn find_by_id_and_owner(
        &self,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<TodoList>, AppError> {
        let sql = format!("{LIST_SELECT} WHERE l.id = $1 AND l.owner_id = $2 {LIST_GROUP_BY}");
        sqlx::query_as::<_, TodoList>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(self.pool())
            .await
            .map_err(SqlxErrorExt::into_app_error)
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<TodoList>, AppError> {
        let sql = format!("{LIST_SELECT} WHERE l.owner_id = $1 {LIST_GROUP_BY} ORDER BY l.id");
        sqlx::query_as::<_, TodoList>(&sql)
            .bind(owner_id)
            .fetch_all(self.pool())
            .await
            .map_err(SqlxErrorExt::into_app_error)
    }

    async fn page_by_owner(
        &self,
        owner_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<TodoList>, i64), AppError> {
        let total = self.count_by_owner(owner_id).await?;

        let sql = format!(
            "{LIST_SELECT} WHERE l.owner_id = $1 {LIST_GROUP_BY} ORDER BY {} LIMIT $2 OFFSET $3",
            list_order_by(&page)
        );
        let rows = sqlx::query_as::<_, TodoList>(&sql)
            .bind(owner_id)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(self.pool())
            .await
            .map_err(SqlxErrorExt::into_app_error)?;

        Ok((rows, total))
    }

    async fn search_by_title(&self, owner_id: i64, title: &str) -> Result<Vec<TodoList>, AppError> {
        let sql = format!(
            r"{LIST_SELECT} WHERE l.owner_id = $1 AND l.title ILIKE $2 ESCAPE '\' {LIST_GROUP_BY} ORDER BY l.id"
        );
        sqlx::query_as::<_, TodoList>(&sql)
            .bind(owner_id)
            .bind(like_pattern(title))
            .fetch_all(self.pool())
            .await
            .map_err(SqlxErrorExt::into_app_error)
    }

    async fn page_by_progress(
        &self,
        owner_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<TodoList>, i64), AppError> {
        let total = self.count_by_owner(owner_id).await?;

        let sql = format!(
            "{LIST_SELECT} WHERE l.owner_id = $1 {LIST_GROUP_BY} ORDER BY {PROGRESS_ORDER} LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, TodoList>(&sql)
            .bind(owner_id)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(self.pool())
            .await
            .map_err(SqlxErrorExt::into_app_error)?;

        Ok((rows, total))
    }

    async fn count_by_owner(&self, owner_id: i64) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM todo_lists WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(self.pool())
            .await
            .map_err(SqlxErrorExt::into_app_error)
    }

    async fn insert(&self, owner_id: i64, fields: &ListFields) -> Result<TodoList, AppError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO todo_lists (owner_id, title, description)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(owner_id)
        .bind(&fields.title)
        .bind(fields.description.as_deref())
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            e.into_app_error_or_missing(|| {
                AppError::not_found(format!("User {owner_id} not found"))
            })
        })?;

        self.find_by_id_and_owner(id, owner_id)
            .await?
            .ok_or_else(|| AppError::internal(format!("Todo list {id} vanished after insert")))
    }

    async fn update(
        &self,
        id: i64,
        owner_id: i64,
        expected_version: i32,
        fields: &ListFields,
    ) -> Result<Option<TodoList>, AppError> {
        let updated = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE todo_lists SET
                title = $4,
                description = $5,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2 AND version = $3
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(expected_version)
        .bind(&fields.title)
        .bind(fields.description.as_deref())
        .fetch_optional(self.pool())
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        match updated {
            Some(id) => self.find_by_id_and_owner(id, owner_id).await,
            None => Ok(None),
        }
    }

    async fn delete_with_tasks(&self, id: i64, owner_id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool().begin().await.map_err(SqlxErrorExt::into_app_error)?;

        let owned = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM todo_lists WHERE id = $1 AND owner_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        if owned.is_none() {
            tx.rollback().await.map_err(SqlxErrorExt::into_app_error)?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM todo_tasks WHERE todo_list_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;

        sqlx::query("DELETE FROM todo_lists WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;

        tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
        Ok(true)
    }

    async fn delete_all_by_owner(&self, owner_id: i64) -> Result<u64, AppError> {
        let mut tx = self.pool().begin().await.map_err(SqlxErrorExt::into_app_error)?;

        sqlx::query(
            r#"
            DELETE FROM todo_tasks
            WHERE todo_list_id IN (SELECT id FROM todo_lists WHERE owner_id = $1)
            "#,
        )
        .bind(owner_id)
        .execute(&mut *tx)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        let result = sqlx::query("DELETE FROM todo_lists WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&mut *tx)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;

        tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
        Ok(result.rows_affected())
    }
}
