//! Persistence layer.
//!
//! Services talk to the store through the traits below. [`PgStore`] is the
//! PostgreSQL implementation used in production; [`MemoryStore`] keeps
//! everything in process and backs the test suites and local runs.
//!
//! Every mutating write on a versioned row is a compare-and-increment: the
//! caller passes the version it read and gets `Ok(None)` back when the row
//! moved on (or vanished) in the meantime.

pub mod memory;
pub mod todo_list;
pub mod todo_task;
pub mod user;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_types::{
    AppError, ListFields, NewUser, PageRequest, StoreBackend, TaskFields, TaskPriority, TodoList,
    TodoTask, User, UserChanges,
};
use sqlx::{Pool, Postgres};

pub use memory::MemoryStore;

/// Store-level health, surfaced by `/health`.
#[async_trait]
pub trait Datastore: Send + Sync {
    fn backend(&self) -> StoreBackend;

    /// Round-trip to the store. Fails when it cannot be reached.
    async fn ping(&self) -> Result<(), AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// All users ordered by id, optionally only the active ones.
    async fn list(&self, active_only: bool) -> Result<Vec<User>, AppError>;

    async fn exists_by_username(&self, username: &str) -> Result<bool, AppError>;
    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError>;

    /// Fails with Conflict when the username or email is taken.
    async fn insert(&self, user: &NewUser) -> Result<User, AppError>;

    async fn update_profile(
        &self,
        id: i64,
        expected_version: i32,
        changes: &UserChanges,
    ) -> Result<Option<User>, AppError>;

    async fn update_password(
        &self,
        id: i64,
        expected_version: i32,
        password_hash: &str,
    ) -> Result<Option<User>, AppError>;

    async fn update_active(
        &self,
        id: i64,
        expected_version: i32,
        active: bool,
    ) -> Result<Option<User>, AppError>;

    /// Returns false when nothing was deleted. Fails with Conflict while the
    /// user still owns lists.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

/// Lists are always addressed together with their owner.
#[async_trait]
pub trait TodoListRepository: Send + Sync {
    async fn find_by_id_and_owner(&self, id: i64, owner_id: i64)
        -> Result<Option<TodoList>, AppError>;

    /// Every list of the owner in creation order.
    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<TodoList>, AppError>;

    /// One page plus the total number of lists the owner has.
    async fn page_by_owner(
        &self,
        owner_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<TodoList>, i64), AppError>;

    /// Case-insensitive substring match on the title.
    async fn search_by_title(&self, owner_id: i64, title: &str)
        -> Result<Vec<TodoList>, AppError>;

    /// Ordered by completion percentage, highest first. Ties break on id.
    async fn page_by_progress(
        &self,
        owner_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<TodoList>, i64), AppError>;

    async fn count_by_owner(&self, owner_id: i64) -> Result<i64, AppError>;

    async fn insert(&self, owner_id: i64, fields: &ListFields) -> Result<TodoList, AppError>;

    async fn update(
        &self,
        id: i64,
        owner_id: i64,
        expected_version: i32,
        fields: &ListFields,
    ) -> Result<Option<TodoList>, AppError>;

    /// Deletes the list and its tasks atomically. False when the owner has no such list.
    async fn delete_with_tasks(&self, id: i64, owner_id: i64) -> Result<bool, AppError>;

    /// Deletes every list of the owner and all their tasks atomically.
    /// Returns the number of lists removed.
    async fn delete_all_by_owner(&self, owner_id: i64) -> Result<u64, AppError>;
}

/// Row filter for task listings inside a single list.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskFilter {
    All,
    Completed(bool),
    Priority(TaskPriority),
    /// Not completed with a due date strictly before the instant.
    OverdueAt(DateTime<Utc>),
    TitleContains(String),
}

/// Tasks are always addressed together with their list.
#[async_trait]
pub trait TodoTaskRepository: Send + Sync {
    async fn find_by_id_and_list(&self, id: i64, list_id: i64)
        -> Result<Option<TodoTask>, AppError>;

    /// Matching tasks of the list in creation order.
    async fn list_by_list(&self, list_id: i64, filter: &TaskFilter)
        -> Result<Vec<TodoTask>, AppError>;

    async fn page_by_list(
        &self,
        list_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<TodoTask>, i64), AppError>;

    /// Tasks across every list the owner has, grouped by list.
    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<TodoTask>, AppError>;

    /// `completed = None` counts every task.
    async fn count_by_list(&self, list_id: i64, completed: Option<bool>) -> Result<i64, AppError>;

    async fn insert(&self, list_id: i64, fields: &TaskFields) -> Result<TodoTask, AppError>;

    async fn update(
        &self,
        id: i64,
        list_id: i64,
        expected_version: i32,
        fields: &TaskFields,
    ) -> Result<Option<TodoTask>, AppError>;

    async fn delete(&self, id: i64, list_id: i64) -> Result<bool, AppError>;

    async fn delete_by_list(&self, list_id: i64) -> Result<u64, AppError>;
}

/// The set of repositories a request works with.
#[derive(Clone)]
pub struct Repositories {
    pub datastore: Arc<dyn Datastore>,
    pub users: Arc<dyn UserRepository>,
    pub lists: Arc<dyn TodoListRepository>,
    pub tasks: Arc<dyn TodoTaskRepository>,
}

impl Repositories {
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self {
            datastore: store.clone(),
            users: store.clone(),
            lists: store.clone(),
            tasks: store,
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            datastore: store.clone(),
            users: store.clone(),
            lists: store.clone(),
            tasks: store,
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories")
            .field("backend", &self.datastore.backend().as_str())
            .finish()
    }
}

/// PostgreSQL-backed implementation of every repository trait.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl Datastore for PgStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Postgres
    }

    async fn ping(&self) -> Result<(), AppError> {
        use crate::error_convert::SqlxErrorExt;

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;
        Ok(())
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
