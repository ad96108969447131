use axum::extract::FromRef;
use shared_types::{AppError, DatabaseConfig, PaginationConfig, StoreBackend};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;

use crate::repo::Repositories;

/// Shared application state passed to Axum handlers via `State`.
/// Derives `FromRef` so handlers can extract `State<Repositories>` or
/// `State<PaginationConfig>` directly.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub repos: Repositories,
    pub pagination: PaginationConfig,
}

impl AppState {
    pub fn new(repos: Repositories, pagination: PaginationConfig) -> Self {
        Self { repos, pagination }
    }

    /// State over the PostgreSQL store.
    pub fn postgres(pool: Pool<Postgres>, pagination: PaginationConfig) -> Self {
        Self::new(Repositories::postgres(pool), pagination)
    }

    /// State over a fresh, empty in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Repositories::in_memory(), PaginationConfig::default())
    }
}

/// Create a database connection pool.
/// Uses `connect_lazy` so no connections open until the first query.
pub fn create_pool(config: &DatabaseConfig) -> Result<Pool<Postgres>, AppError> {
    let database_url = config
        .url
        .as_deref()
        .ok_or_else(|| AppError::internal("DATABASE_URL must be set for the postgres store"))?;

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_lazy(database_url)
        .map_err(|e| AppError::database(format!("Failed to create database pool: {e}")))
}

/// Run database migrations against the given pool.
pub async fn run_migrations(pool: &Pool<Postgres>) -> Result<(), AppError> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to run database migrations: {e}")))
}

/// Build the repositories for the configured backend. The postgres backend
/// is migrated before it is handed out.
pub async fn connect(config: &DatabaseConfig) -> Result<Repositories, AppError> {
    match config.backend {
        StoreBackend::Memory => Ok(Repositories::in_memory()),
        StoreBackend::Postgres => {
            let pool = create_pool(config)?;
            run_migrations(&pool).await?;
            Ok(Repositories::postgres(pool))
        }
    }
}
