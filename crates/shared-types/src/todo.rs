use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(feature = "validation")]
use validator::{Validate, ValidationError};

/// Percentage of completed tasks, rounded down. Zero when there are no tasks.
pub fn progress_percentage(completed: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    completed * 100 / total
}

/// Rejects values that are empty once surrounding whitespace is removed.
#[cfg(feature = "validation")]
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("Title is required".into()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Urgent => "URGENT",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            "URGENT" => Some(Self::Urgent),
            _ => None,
        }
    }

    /// Position in LOW < MEDIUM < HIGH < URGENT.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
            Self::Urgent => 3,
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for TaskPriority {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str_opt(&value).ok_or_else(|| format!("Unknown task priority: {}", value))
    }
}

// ---------------------------------------------------------------------------
// Domain Structs
// ---------------------------------------------------------------------------

/// A todo list with its derived task counters, as read from the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct TodoList {
    pub id: i64,
    pub owner_id: i64,
    pub owner_username: String,
    pub title: String,
    pub description: Option<String>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub task_count: i64,
    pub completed_count: i64,
}

impl TodoList {
    pub fn progress_percentage(&self) -> i64 {
        progress_percentage(self.completed_count, self.task_count)
    }
}

/// A task inside a todo list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct TodoTask {
    pub id: i64,
    pub todo_list_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "server", sqlx(try_from = "String"))]
    pub priority: TaskPriority,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TodoTask {
    /// Not completed and due strictly before `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < now)
    }
}

/// Title and description of a list, for inserts and updates.
#[derive(Debug, Clone, PartialEq)]
pub struct ListFields {
    pub title: String,
    pub description: Option<String>,
}

/// Every writable column of a task, for inserts and wholesale updates.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFields {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: TaskPriority,
}

impl From<&TodoTask> for TaskFields {
    fn from(t: &TodoTask) -> Self {
        Self {
            title: t.title.clone(),
            description: t.description.clone(),
            completed: t.completed,
            due_date: t.due_date,
            priority: t.priority,
        }
    }
}

// ---------------------------------------------------------------------------
// TodoList Request/Response DTOs
// ---------------------------------------------------------------------------

/// API response for a todo list, including read-time progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TodoListResponse {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub owner_id: i64,
    pub owner_username: String,
    pub task_count: i64,
    pub completed_task_count: i64,
    pub progress_percentage: i64,
    pub version: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<TodoList> for TodoListResponse {
    fn from(l: TodoList) -> Self {
        let progress = l.progress_percentage();
        Self {
            id: l.id,
            title: l.title,
            description: l.description,
            owner_id: l.owner_id,
            owner_username: l.owner_username,
            task_count: l.task_count,
            completed_task_count: l.completed_count,
            progress_percentage: progress,
            version: l.version,
            created_at: l.created_at.to_rfc3339(),
            updated_at: l.updated_at.to_rfc3339(),
        }
    }
}

/// Request body for creating a todo list. The owner always comes from the path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CreateTodoListRequest {
    #[cfg_attr(
        feature = "validation",
        validate(
            length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"),
            custom(function = "not_blank")
        )
    )]
    pub title: String,
    #[serde(default)]
    #[cfg_attr(
        feature = "validation",
        validate(length(max = 500, message = "Description cannot exceed 500 characters"))
    )]
    pub description: Option<String>,
}

impl From<CreateTodoListRequest> for ListFields {
    fn from(r: CreateTodoListRequest) -> Self {
        Self {
            title: r.title,
            description: r.description,
        }
    }
}

/// Request body for updating a todo list's title and description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct UpdateTodoListRequest {
    #[cfg_attr(
        feature = "validation",
        validate(
            length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"),
            custom(function = "not_blank")
        )
    )]
    pub title: String,
    #[serde(default)]
    #[cfg_attr(
        feature = "validation",
        validate(length(max = 500, message = "Description cannot exceed 500 characters"))
    )]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<i32>,
}

// ---------------------------------------------------------------------------
// TodoTask Request/Response DTOs
// ---------------------------------------------------------------------------

/// API response for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TodoTaskResponse {
    pub id: i64,
    pub todo_list_id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub priority: TaskPriority,
    pub overdue: bool,
    pub version: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<TodoTask> for TodoTaskResponse {
    fn from(t: TodoTask) -> Self {
        let overdue = t.is_overdue(Utc::now());
        Self {
            id: t.id,
            todo_list_id: t.todo_list_id,
            title: t.title,
            description: t.description,
            completed: t.completed,
            due_date: t.due_date.map(|d| d.to_rfc3339()),
            priority: t.priority,
            overdue,
            version: t.version,
            created_at: t.created_at.to_rfc3339(),
            updated_at: t.updated_at.to_rfc3339(),
        }
    }
}

/// Request body for creating a task. The list always comes from the path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CreateTodoTaskRequest {
    #[cfg_attr(
        feature = "validation",
        validate(
            length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"),
            custom(function = "not_blank")
        )
    )]
    pub title: String,
    #[serde(default)]
    #[cfg_attr(
        feature = "validation",
        validate(length(max = 1000, message = "Description cannot exceed 1000 characters"))
    )]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    /// Must be in the future when supplied.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Defaults to MEDIUM.
    #[serde(default)]
    pub priority: Option<TaskPriority>,
}

impl From<CreateTodoTaskRequest> for TaskFields {
    fn from(r: CreateTodoTaskRequest) -> Self {
        Self {
            title: r.title,
            description: r.description,
            completed: r.completed,
            due_date: r.due_date,
            priority: r.priority.unwrap_or_default(),
        }
    }
}

/// Request body for replacing every editable field of a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct UpdateTodoTaskRequest {
    #[cfg_attr(
        feature = "validation",
        validate(
            length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"),
            custom(function = "not_blank")
        )
    )]
    pub title: String,
    #[serde(default)]
    #[cfg_attr(
        feature = "validation",
        validate(length(max = 1000, message = "Description cannot exceed 1000 characters"))
    )]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub version: Option<i32>,
}

impl UpdateTodoTaskRequest {
    pub fn fields(&self) -> TaskFields {
        TaskFields {
            title: self.title.clone(),
            description: self.description.clone(),
            completed: self.completed,
            due_date: self.due_date,
            priority: self.priority,
        }
    }
}

/// Request body for changing only a task's priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SetPriorityRequest {
    pub priority: TaskPriority,
}

/// Request body for changing only a task's due date. `null` clears it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SetDueDateRequest {
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Query parameter for filtering tasks by completion.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct CompletionParams {
    pub completed: bool,
}
