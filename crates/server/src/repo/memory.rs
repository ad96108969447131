//! In-process store with the same observable behavior as the PostgreSQL one:
//! sequential ids, unique usernames and emails, compare-and-increment
//! versions, restricted user deletes and list deletes that take their tasks
//! along. A single lock guards the whole state, so every call is atomic.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_types::{
    AppError, ListFields, NewUser, PageRequest, SortDirection, SortField, StoreBackend, TaskFields,
    TodoList, TodoTask, User, UserChanges,
};
use tokio::sync::RwLock;

use super::{Datastore, TaskFilter, TodoListRepository, TodoTaskRepository, UserRepository};

#[derive(Debug, Clone)]
struct ListRow {
    id: i64,
    owner_id: i64,
    title: String,
    description: Option<String>,
    version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    last_user_id: i64,
    last_list_id: i64,
    last_task_id: i64,
    users: BTreeMap<i64, User>,
    lists: BTreeMap<i64, ListRow>,
    tasks: BTreeMap<i64, TodoTask>,
}

impl State {
    fn username_taken(&self, username: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn check_unique(&self, username: &str, email: &str, except: Option<i64>) -> Result<(), AppError> {
        if self.username_taken(username, except) {
            return Err(AppError::conflict("This username is already taken"));
        }
        if self.email_taken(email, except) {
            return Err(AppError::conflict("An account with this email already exists"));
        }
        Ok(())
    }

    /// Applies `change` when the user exists at `expected_version`.
    fn bump_user(
        &mut self,
        id: i64,
        expected_version: i32,
        change: impl FnOnce(&mut User),
    ) -> Option<User> {
        let user = self.users.get_mut(&id).filter(|u| u.version == expected_version)?;
        change(user);
        user.version += 1;
        user.updated_at = Utc::now();
        Some(user.clone())
    }

    fn materialize(&self, row: &ListRow) -> TodoList {
        let (task_count, completed_count) = self
            .tasks
            .values()
            .filter(|t| t.todo_list_id == row.id)
            .fold((0, 0), |(total, done), t| (total + 1, done + i64::from(t.completed)));

        TodoList {
            id: row.id,
            owner_id: row.owner_id,
            owner_username: self
                .users
                .get(&row.owner_id)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
            title: row.title.clone(),
            description: row.description.clone(),
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
            task_count,
            completed_count,
        }
    }

    fn lists_of(&self, owner_id: i64) -> Vec<TodoList> {
        self.lists
            .values()
            .filter(|l| l.owner_id == owner_id)
            .map(|l| self.materialize(l))
            .collect()
    }

    fn tasks_of(&self, list_id: i64) -> impl Iterator<Item = &TodoTask> {
        self.tasks.values().filter(move |t| t.todo_list_id == list_id)
    }

    fn remove_list(&mut self, list_id: i64) {
        self.tasks.retain(|_, t| t.todo_list_id != list_id);
        self.lists.remove(&list_id);
    }
}

/// Memory-backed implementation of every repository trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

fn paginate<T>(mut rows: Vec<T>, page: &PageRequest) -> (Vec<T>, i64) {
    let total = rows.len() as i64;
    let offset = page.offset().clamp(0, total) as usize;
    let limit = page.limit.max(0) as usize;
    let data: Vec<T> = rows.drain(offset..).take(limit).collect();
    (data, total)
}

fn compare_lists(a: &TodoList, b: &TodoList, page: &PageRequest) -> Ordering {
    let primary = match page.sort {
        SortField::Id => Ordering::Equal,
        SortField::Title => a.title.cmp(&b.title),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::CreatedAt | SortField::DueDate | SortField::Priority => {
            a.created_at.cmp(&b.created_at)
        }
    };
    directed(primary.then(a.id.cmp(&b.id)), page.direction)
}

fn compare_tasks(a: &TodoTask, b: &TodoTask, page: &PageRequest) -> Ordering {
    let primary = match page.sort {
        SortField::Id => Ordering::Equal,
        SortField::Title => a.title.cmp(&b.title),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Priority => a.priority.rank().cmp(&b.priority.rank()),
        SortField::DueDate => match (a.due_date, b.due_date) {
            // Missing due dates sort last in either direction.
            (None, None) => Ordering::Equal,
            (None, Some(_)) => return Ordering::Greater,
            (Some(_), None) => return Ordering::Less,
            (Some(x), Some(y)) => x.cmp(&y),
        },
    };
    directed(primary.then(a.id.cmp(&b.id)), page.direction)
}

#[async_trait]
impl Datastore for MemoryStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Memory
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self, active_only: bool) -> Result<Vec<User>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .filter(|u| !active_only || u.active)
            .cloned()
            .collect())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, AppError> {
        Ok(self.state.read().await.username_taken(username, None))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError> {
        Ok(self.state.read().await.email_taken(email, None))
    }

    async fn insert(&self, user: &NewUser) -> Result<User, AppError> {
        let mut state = self.state.write().await;
        state.check_unique(&user.username, &user.email, None)?;

        state.last_user_id += 1;
        let now = Utc::now();
        let created = User {
            id: state.last_user_id,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            active: true,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_profile(
        &self,
        id: i64,
        expected_version: i32,
        changes: &UserChanges,
    ) -> Result<Option<User>, AppError> {
        let mut state = self.state.write().await;
        if state.users.contains_key(&id) {
            state.check_unique(&changes.username, &changes.email, Some(id))?;
        }
        Ok(state.bump_user(id, expected_version, |u| {
            u.username = changes.username.clone();
            u.email = changes.email.clone();
            u.first_name = changes.first_name.clone();
            u.last_name = changes.last_name.clone();
        }))
    }

    async fn update_password(
        &self,
        id: i64,
        expected_version: i32,
        password_hash: &str,
    ) -> Result<Option<User>, AppError> {
        let mut state = self.state.write().await;
        Ok(state.bump_user(id, expected_version, |u| {
            u.password_hash = password_hash.to_string();
        }))
    }

    async fn update_active(
        &self,
        id: i64,
        expected_version: i32,
        active: bool,
    ) -> Result<Option<User>, AppError> {
        let mut state = self.state.write().await;
        Ok(state.bump_user(id, expected_version, |u| u.active = active))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        if state.lists.values().any(|l| l.owner_id == id) {
            return Err(AppError::conflict(
                "The record is still referenced by other records",
            ));
        }
        Ok(state.users.remove(&id).is_some())
    }
}

#[async_trait]
impl TodoListRepository for MemoryStore {
    async fn find_by_id_and_owner(
        &self,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<TodoList>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .lists
            .get(&id)
            .filter(|l| l.owner_id == owner_id)
            .map(|l| state.materialize(l)))
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<TodoList>, AppError> {
        Ok(self.state.read().await.lists_of(owner_id))
    }

    async fn page_by_owner(
        &self,
        owner_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<TodoList>, i64), AppError> {
        let mut lists = self.state.read().await.lists_of(owner_id);
        lists.sort_by(|a, b| compare_lists(a, b, &page));
        Ok(paginate(lists, &page))
    }

    async fn search_by_title(&self, owner_id: i64, title: &str) -> Result<Vec<TodoList>, AppError> {
        let mut lists = self.state.read().await.lists_of(owner_id);
        lists.retain(|l| contains_ignore_case(&l.title, title));
        Ok(lists)
    }

    async fn page_by_progress(
        &self,
        owner_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<TodoList>, i64), AppError> {
        let mut lists = self.state.read().await.lists_of(owner_id);
        lists.sort_by(|a, b| {
            b.progress_percentage()
                .cmp(&a.progress_percentage())
                .then(a.id.cmp(&b.id))
        });
        Ok(paginate(lists, &page))
    }

    async fn count_by_owner(&self, owner_id: i64) -> Result<i64, AppError> {
        let state = self.state.read().await;
        Ok(state.lists.values().filter(|l| l.owner_id == owner_id).count() as i64)
    }

    async fn insert(&self, owner_id: i64, fields: &ListFields) -> Result<TodoList, AppError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&owner_id) {
            return Err(AppError::not_found(format!("User {owner_id} not found")));
        }

        state.last_list_id += 1;
        let now = Utc::now();
        let row = ListRow {
            id: state.last_list_id,
            owner_id,
            title: fields.title.clone(),
            description: fields.description.clone(),
            version: 0,
            created_at: now,
            updated_at: now,
        };
        let list = state.materialize(&row);
        state.lists.insert(row.id, row);
        Ok(list)
    }

    async fn update(
        &self,
        id: i64,
        owner_id: i64,
        expected_version: i32,
        fields: &ListFields,
    ) -> Result<Option<TodoList>, AppError> {
        let mut state = self.state.write().await;
        let Some(row) = state
            .lists
            .get_mut(&id)
            .filter(|l| l.owner_id == owner_id && l.version == expected_version)
        else {
            return Ok(None);
        };

        row.title = fields.title.clone();
        row.description = fields.description.clone();
        row.version += 1;
        row.updated_at = Utc::now();
        let row = row.clone();
        Ok(Some(state.materialize(&row)))
    }

    async fn delete_with_tasks(&self, id: i64, owner_id: i64) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let owned = state.lists.get(&id).is_some_and(|l| l.owner_id == owner_id);
        if owned {
            state.remove_list(id);
        }
        Ok(owned)
    }

    async fn delete_all_by_owner(&self, owner_id: i64) -> Result<u64, AppError> {
        let mut state = self.state.write().await;
        let ids: Vec<i64> = state
            .lists
            .values()
            .filter(|l| l.owner_id == owner_id)
            .map(|l| l.id)
            .collect();
        for id in &ids {
            state.remove_list(*id);
        }
        Ok(ids.len() as u64)
    }
}

#[async_trait]
impl TodoTaskRepository for MemoryStore {
    async fn find_by_id_and_list(
        &self,
        id: i64,
        list_id: i64,
    ) -> Result<Option<TodoTask>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .tasks
            .get(&id)
            .filter(|t| t.todo_list_id == list_id)
            .cloned())
    }

    async fn list_by_list(
        &self,
        list_id: i64,
        filter: &TaskFilter,
    ) -> Result<Vec<TodoTask>, AppError> {
        let state = self.state.read().await;
        let mut tasks: Vec<TodoTask> = state
            .tasks_of(list_id)
            .filter(|t| match filter {
                TaskFilter::All => true,
                TaskFilter::Completed(completed) => t.completed == *completed,
                TaskFilter::Priority(priority) => t.priority == *priority,
                TaskFilter::OverdueAt(now) => t.is_overdue(*now),
                TaskFilter::TitleContains(title) => contains_ignore_case(&t.title, title),
            })
            .cloned()
            .collect();

        if matches!(filter, TaskFilter::OverdueAt(_)) {
            tasks.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.id.cmp(&b.id)));
        }
        Ok(tasks)
    }

    async fn page_by_list(
        &self,
        list_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<TodoTask>, i64), AppError> {
        let state = self.state.read().await;
        let mut tasks: Vec<TodoTask> = state.tasks_of(list_id).cloned().collect();
        tasks.sort_by(|a, b| compare_tasks(a, b, &page));
        Ok(paginate(tasks, &page))
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<TodoTask>, AppError> {
        let state = self.state.read().await;
        let mut tasks: Vec<TodoTask> = state
            .tasks
            .values()
            .filter(|t| {
                state
                    .lists
                    .get(&t.todo_list_id)
                    .is_some_and(|l| l.owner_id == owner_id)
            })
            .cloned()
            .collect();
        tasks.sort_by_key(|t| (t.todo_list_id, t.id));
        Ok(tasks)
    }

    async fn count_by_list(&self, list_id: i64, completed: Option<bool>) -> Result<i64, AppError> {
        let state = self.state.read().await;
        Ok(state
            .tasks_of(list_id)
            .filter(|t| completed.is_none_or(|c| t.completed == c))
            .count() as i64)
    }

    async fn insert(&self, list_id: i64, fields: &TaskFields) -> Result<TodoTask, AppError> {
        let mut state = self.state.write().await;
        if !state.lists.contains_key(&list_id) {
            return Err(AppError::not_found(format!("Todo list {list_id} not found")));
        }

        state.last_task_id += 1;
        let now = Utc::now();
        let task = TodoTask {
            id: state.last_task_id,
            todo_list_id: list_id,
            title: fields.title.clone(),
            description: fields.description.clone(),
            completed: fields.completed,
            due_date: fields.due_date,
            priority: fields.priority,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        state.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update(
        &self,
        id: i64,
        list_id: i64,
        expected_version: i32,
        fields: &TaskFields,
    ) -> Result<Option<TodoTask>, AppError> {
        let mut state = self.state.write().await;
        let Some(task) = state
            .tasks
            .get_mut(&id)
            .filter(|t| t.todo_list_id == list_id && t.version == expected_version)
        else {
            return Ok(None);
        };

        task.title = fields.title.clone();
        task.description = fields.description.clone();
        task.completed = fields.completed;
        task.due_date = fields.due_date;
        task.priority = fields.priority;
        task.version += 1;
        task.updated_at = Utc::now();
        Ok(Some(task.clone()))
    }

    async fn delete(&self, id: i64, list_id: i64) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let owned = state.tasks.get(&id).is_some_and(|t| t.todo_list_id == list_id);
        if owned {
            state.tasks.remove(&id);
        }
        Ok(owned)
    }

    async fn delete_by_list(&self, list_id: i64) -> Result<u64, AppError> {
        let mut state = self.state.write().await;
        let before = state.tasks.len();
        state.tasks.retain(|_, t| t.todo_list_id != list_id);
        Ok((before - state.tasks.len()) as u64)
    }
}
