use async_trait::async_trait;
use shared_types::{AppError, NewUser, User, UserChanges};

use super::{PgStore, UserRepository};
use crate::error_convert::SqlxErrorExt;

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, \
                            active, version, created_at, updated_at";

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(SqlxErrorExt::into_app_error)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(self.pool())
            .await
            .map_err(SqlxErrorExt::into_app_error)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(self.pool())
            .await
            .map_err(SqlxErrorExt::into_app_error)
    }

    async fn list(&self, active_only: bool) -> Result<Vec<User>, AppError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE ($1 = FALSE OR active = TRUE) ORDER BY id"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(active_only)
            .fetch_all(self.pool())
            .await
            .map_err(SqlxErrorExt::into_app_error)
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(self.pool())
            .await
            .map_err(SqlxErrorExt::into_app_error)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(self.pool())
            .await
            .map_err(SqlxErrorExt::into_app_error)
    }

    async fn insert(&self, user: &NewUser) -> Result<User, AppError> {
        let sql = format!(
            r#"
            INSERT INTO users (username, email, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.first_name.as_deref())
            .bind(user.last_name.as_deref())
            .fetch_one(self.pool())
            .await
            .map_err(SqlxErrorExt::into_app_error)
    }

    async fn update_profile(
        &self,
        id: i64,
        expected_version: i32,
        changes: &UserChanges,
    ) -> Result<Option<User>, AppError> {
        let sql = format!(
            r#"
            UPDATE users SET
                username = $3,
                email = $4,
                first_name = $5,
                last_name = $6,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(expected_version)
            .bind(&changes.username)
            .bind(&changes.email)
            .bind(changes.first_name.as_deref())
            .bind(changes.last_name.as_deref())
            .fetch_optional(self.pool())
            .await
            .map_err(SqlxErrorExt::into_app_error)
    }

    async fn update_password(
        &self,
        id: i64,
        expected_version: i32,
        password_hash: &str,
    ) -> Result<Option<User>, AppError> {
        let sql = format!(
            r#"
            UPDATE users SET password_hash = $3, version = version + 1, updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(expected_version)
            .bind(password_hash)
            .fetch_optional(self.pool())
            .await
            .map_err(SqlxErrorExt::into_app_error)
    }

    async fn update_active(
        &self,
        id: i64,
        expected_version: i32,
        active: bool,
    ) -> Result<Option<User>, AppError> {
        let sql = format!(
            r#"
            UPDATE users SET active = $3, version = version + 1, updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(expected_version)
            .bind(active)
            .fetch_optional(self.pool())
            .await
            .map_err(SqlxErrorExt::into_app_error)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(SqlxErrorExt::into_app_error)?;

        Ok(result.rows_affected() > 0)
    }
}
