use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Domain Struct
// ---------------------------------------------------------------------------

/// A registered user. Owns todo lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string; never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub active: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// "First Last", falling back to whichever part exists, then the username.
    pub fn full_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.to_string(),
            (None, Some(last)) => last.to_string(),
            (None, None) => self.username.clone(),
        }
    }
}

/// Fields for a user row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Profile fields replaced by an update.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Request/Response DTOs
// ---------------------------------------------------------------------------

/// API response for a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub full_name: String,
    pub active: bool,
    pub version: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        let full_name = u.full_name();
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            full_name,
            active: u.active,
            version: u.version,
            created_at: u.created_at.to_rfc3339(),
            updated_at: u.updated_at.to_rfc3339(),
        }
    }
}

/// Request body for registering a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(validator::Validate))]
pub struct RegisterUserRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))
    )]
    pub username: String,
    #[cfg_attr(
        feature = "validation",
        validate(
            email(message = "Email should be valid"),
            length(max = 100, message = "Email cannot exceed 100 characters")
        )
    )]
    pub email: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 6, max = 120, message = "Password must be between 6 and 120 characters"))
    )]
    pub password: String,
    #[serde(default)]
    #[cfg_attr(
        feature = "validation",
        validate(length(max = 50, message = "First name cannot exceed 50 characters"))
    )]
    pub first_name: Option<String>,
    #[serde(default)]
    #[cfg_attr(
        feature = "validation",
        validate(length(max = 50, message = "Last name cannot exceed 50 characters"))
    )]
    pub last_name: Option<String>,
}

/// Request body for updating a user's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(validator::Validate))]
pub struct UpdateUserRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))
    )]
    pub username: String,
    #[cfg_attr(
        feature = "validation",
        validate(
            email(message = "Email should be valid"),
            length(max = 100, message = "Email cannot exceed 100 characters")
        )
    )]
    pub email: String,
    #[serde(default)]
    #[cfg_attr(
        feature = "validation",
        validate(length(max = 50, message = "First name cannot exceed 50 characters"))
    )]
    pub first_name: Option<String>,
    #[serde(default)]
    #[cfg_attr(
        feature = "validation",
        validate(length(max = 50, message = "Last name cannot exceed 50 characters"))
    )]
    pub last_name: Option<String>,
    /// Version the client last read; omitted means "whatever is current".
    #[serde(default)]
    pub version: Option<i32>,
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(r: UpdateUserRequest) -> Self {
        Self {
            username: r.username,
            email: r.email,
            first_name: r.first_name,
            last_name: r.last_name,
        }
    }
}

/// Request body for changing a password.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(validator::Validate))]
pub struct ChangePasswordRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 6, max = 120, message = "Password must be between 6 and 120 characters"))
    )]
    pub new_password: String,
}

/// Request body for activating or deactivating a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SetActiveRequest {
    pub active: bool,
}
