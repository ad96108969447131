use shared_types::{AppError, NewUser, RegisterUserRequest, UpdateUserRequest, User, UserChanges};

use super::expected_version;
use crate::password::hash_password;
use crate::repo::Repositories;

pub async fn find_by_id(repos: &Repositories, id: i64) -> Result<Option<User>, AppError> {
    repos.users.find_by_id(id).await
}

/// Like [`find_by_id`], but absence is a NotFound error.
pub async fn get_by_id(repos: &Repositories, id: i64) -> Result<User, AppError> {
    find_by_id(repos, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
}

pub async fn find_by_username(
    repos: &Repositories,
    username: &str,
) -> Result<Option<User>, AppError> {
    repos.users.find_by_username(username).await
}

pub async fn find_by_email(repos: &Repositories, email: &str) -> Result<Option<User>, AppError> {
    repos.users.find_by_email(email).await
}

pub async fn find_all(repos: &Repositories) -> Result<Vec<User>, AppError> {
    repos.users.list(false).await
}

pub async fn find_all_active(repos: &Repositories) -> Result<Vec<User>, AppError> {
    repos.users.list(true).await
}

pub async fn exists_by_username(repos: &Repositories, username: &str) -> Result<bool, AppError> {
    repos.users.exists_by_username(username).await
}

pub async fn exists_by_email(repos: &Repositories, email: &str) -> Result<bool, AppError> {
    repos.users.exists_by_email(email).await
}

/// Create a user. The password is stored only as an Argon2 hash.
pub async fn register(repos: &Repositories, req: RegisterUserRequest) -> Result<User, AppError> {
    if repos.users.exists_by_username(&req.username).await? {
        return Err(AppError::conflict("This username is already taken"));
    }
    if repos.users.exists_by_email(&req.email).await? {
        return Err(AppError::conflict("An account with this email already exists"));
    }

    let new_user = NewUser {
        password_hash: hash_password(&req.password)?,
        username: req.username,
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
    };

    // The store's unique constraints still catch a concurrent registration.
    let user = repos.users.insert(&new_user).await?;
    tracing::info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Replace the profile fields. Taking a username or email that belongs to a
/// different user is a conflict; keeping one's own is fine.
pub async fn update(
    repos: &Repositories,
    id: i64,
    req: UpdateUserRequest,
) -> Result<User, AppError> {
    let current = get_by_id(repos, id).await?;

    if let Some(other) = repos.users.find_by_username(&req.username).await? {
        if other.id != id {
            return Err(AppError::conflict("This username is already taken"));
        }
    }
    if let Some(other) = repos.users.find_by_email(&req.email).await? {
        if other.id != id {
            return Err(AppError::conflict("An account with this email already exists"));
        }
    }

    let version = expected_version(req.version, current.version);
    let changes = UserChanges::from(req);
    repos
        .users
        .update_profile(id, version, &changes)
        .await?
        .ok_or_else(|| AppError::stale_version("User", id))
}

pub async fn change_password(
    repos: &Repositories,
    id: i64,
    new_password: &str,
) -> Result<(), AppError> {
    let current = get_by_id(repos, id).await?;
    let hash = hash_password(new_password)?;

    repos
        .users
        .update_password(id, current.version, &hash)
        .await?
        .ok_or_else(|| AppError::stale_version("User", id))?;

    tracing::info!(user_id = id, "password changed");
    Ok(())
}

pub async fn set_active(repos: &Repositories, id: i64, active: bool) -> Result<User, AppError> {
    let current = get_by_id(repos, id).await?;
    repos
        .users
        .update_active(id, current.version, active)
        .await?
        .ok_or_else(|| AppError::stale_version("User", id))
}

/// Delete a user. Users that still own lists cannot be deleted.
pub async fn delete(repos: &Repositories, id: i64) -> Result<(), AppError> {
    get_by_id(repos, id).await?;

    let owned = repos.lists.count_by_owner(id).await?;
    if owned > 0 {
        return Err(AppError::conflict(format!(
            "User {id} still owns {owned} todo list(s); delete them first"
        )));
    }

    if !repos.users.delete(id).await? {
        return Err(AppError::not_found(format!("User {id} not found")));
    }

    tracing::info!(user_id = id, "user deleted");
    Ok(())
}
