use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared_types::{
    AppError, ChangePasswordRequest, ExistsResponse, RegisterUserRequest, SetActiveRequest,
    UpdateUserRequest, UserResponse,
};

use crate::error_convert::ValidateRequest;
use crate::repo::Repositories;
use crate::service::user as users;

/// List all users.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>)
    ),
    tag = "users"
)]
#[tracing::instrument(skip(repos))]
pub async fn list_users(
    State(repos): State<Repositories>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = users::find_all(&repos).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// List users whose account is active.
#[utoipa::path(
    get,
    path = "/api/v1/users/active",
    responses(
        (status = 200, description = "Active users", body = Vec<UserResponse>)
    ),
    tag = "users"
)]
#[tracing::instrument(skip(repos))]
pub async fn list_active_users(
    State(repos): State<Repositories>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = users::find_all_active(&repos).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Register a new user.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 409, description = "Username or email already taken", body = AppError),
        (status = 422, description = "Validation failed", body = AppError)
    ),
    tag = "users"
)]
#[tracing::instrument(skip(repos, payload), fields(username = %payload.username))]
pub async fn register_user(
    State(repos): State<Repositories>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    payload.validate_request()?;
    let user = users::register(&repos, payload).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Get a user by ID.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found", body = AppError)
    ),
    tag = "users"
)]
#[tracing::instrument(skip(repos))]
pub async fn get_user(
    State(repos): State<Repositories>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    let user = users::get_by_id(&repos, id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Update a user's profile.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "User not found", body = AppError),
        (status = 409, description = "Username or email taken, or stale version", body = AppError),
        (status = 422, description = "Validation failed", body = AppError)
    ),
    tag = "users"
)]
#[tracing::instrument(skip(repos))]
pub async fn update_user(
    State(repos): State<Repositories>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    payload.validate_request()?;
    let user = users::update(&repos, id, payload).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Delete a user. Fails while the user still owns todo lists.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found", body = AppError),
        (status = 409, description = "User still owns todo lists", body = AppError)
    ),
    tag = "users"
)]
#[tracing::instrument(skip(repos))]
pub async fn delete_user(
    State(repos): State<Repositories>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    users::delete(&repos, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get a user by username.
#[utoipa::path(
    get,
    path = "/api/v1/users/username/{username}",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found", body = AppError)
    ),
    tag = "users"
)]
#[tracing::instrument(skip(repos))]
pub async fn get_user_by_username(
    State(repos): State<Repositories>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let user = users::find_by_username(&repos, &username)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User '{username}' not found")))?;
    Ok(Json(UserResponse::from(user)))
}

/// Get a user by email address.
#[utoipa::path(
    get,
    path = "/api/v1/users/email/{email}",
    params(("email" = String, Path, description = "Email address")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found", body = AppError)
    ),
    tag = "users"
)]
#[tracing::instrument(skip(repos))]
pub async fn get_user_by_email(
    State(repos): State<Repositories>,
    Path(email): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let user = users::find_by_email(&repos, &email)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No user with email '{email}'")))?;
    Ok(Json(UserResponse::from(user)))
}

/// Check whether a username is taken.
#[utoipa::path(
    get,
    path = "/api/v1/users/username/{username}/exists",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "Existence flag", body = ExistsResponse)
    ),
    tag = "users"
)]
#[tracing::instrument(skip(repos))]
pub async fn username_exists(
    State(repos): State<Repositories>,
    Path(username): Path<String>,
) -> Result<Json<ExistsResponse>, AppError> {
    let exists = users::exists_by_username(&repos, &username).await?;
    Ok(Json(ExistsResponse { exists }))
}

/// Check whether an email address is registered.
#[utoipa::path(
    get,
    path = "/api/v1/users/email/{email}/exists",
    params(("email" = String, Path, description = "Email address")),
    responses(
        (status = 200, description = "Existence flag", body = ExistsResponse)
    ),
    tag = "users"
)]
#[tracing::instrument(skip(repos))]
pub async fn email_exists(
    State(repos): State<Repositories>,
    Path(email): Path<String>,
) -> Result<Json<ExistsResponse>, AppError> {
    let exists = users::exists_by_email(&repos, &email).await?;
    Ok(Json(ExistsResponse { exists }))
}

/// Activate or deactivate a user.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}/active",
    params(("id" = i64, Path, description = "User ID")),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "Flag updated", body = UserResponse),
        (status = 404, description = "User not found", body = AppError)
    ),
    tag = "users"
)]
#[tracing::instrument(skip(repos))]
pub async fn set_user_active(
    State(repos): State<Repositories>,
    Path(id): Path<i64>,
    Json(payload): Json<SetActiveRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = users::set_active(&repos, id, payload.active).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Replace a user's password.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}/password",
    params(("id" = i64, Path, description = "User ID")),
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 404, description = "User not found", body = AppError),
        (status = 422, description = "Validation failed", body = AppError)
    ),
    tag = "users"
)]
#[tracing::instrument(skip(repos, payload))]
pub async fn change_password(
    State(repos): State<Repositories>,
    Path(id): Path<i64>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    payload.validate_request()?;
    users::change_password(&repos, id, &payload.new_password).await?;
    Ok(StatusCode::NO_CONTENT)
}
