use shared_types::AppError;

/// Convert a sqlx::Error into an AppError.
pub fn sqlx_to_app_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::RowNotFound => AppError::not_found("Resource not found"),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation (error code 23505)
            if db_err.code().as_deref() == Some("23505") {
                let detail = db_err.message();
                let constraint = db_err.constraint().unwrap_or_default();
                let friendly = if detail.contains("email") || constraint.contains("email") {
                    "An account with this email already exists"
                } else if detail.contains("username") || constraint.contains("username") {
                    "This username is already taken"
                } else {
                    "A record with this value already exists"
                };
                return AppError::conflict(friendly);
            }
            // Foreign key violation (23503): a row is still referenced.
            if db_err.code().as_deref() == Some("23503") {
                return AppError::conflict("The record is still referenced by other records");
            }
            AppError::database(err.to_string())
        }
        _ => AppError::database(err.to_string()),
    }
}

/// Extension trait providing `.into_app_error()` on sqlx::Error.
pub trait SqlxErrorExt {
    fn into_app_error(self) -> AppError;

    /// Like `into_app_error`, but an insert whose parent row is gone
    /// (foreign key violation) becomes the given NotFound.
    fn into_app_error_or_missing(self, missing: impl FnOnce() -> AppError) -> AppError;
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23503"))
}

impl SqlxErrorExt for sqlx::Error {
    fn into_app_error(self) -> AppError {
        sqlx_to_app_error(self)
    }

    fn into_app_error_or_missing(self, missing: impl FnOnce() -> AppError) -> AppError {
        if is_foreign_key_violation(&self) {
            missing()
        } else {
            sqlx_to_app_error(self)
        }
    }
}

/// Trait for validating request DTOs before processing.
pub trait ValidateRequest {
    fn validate_request(&self) -> Result<(), AppError>;
}

impl<T: validator::Validate> ValidateRequest for T {
    fn validate_request(&self) -> Result<(), AppError> {
        self.validate().map_err(AppError::from)
    }
}
