use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("You do not have access to this {0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("{0} is not configured")]
    Unavailable(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Session store error: {0}")]
    Session(#[from] redis::RedisError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) | AppError::Session(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            error!("Request failed: {}", self);
            "Something went wrong, please try again later".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Resolves a looked-up record against the caller, telling a missing record
/// apart from one that belongs to another account.
pub fn owned_by<M>(
    record: Option<M>,
    user_id: i64,
    owner: impl FnOnce(&M) -> i64,
    what: &'static str,
) -> AppResult<M> {
    let record = record.ok_or(AppError::NotFound(what))?;
    if owner(&record) != user_id {
        return Err(AppError::Forbidden(what));
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        user_id: i64,
    }

    #[test]
    fn owned_by_distinguishes_missing_from_forbidden() {
        let missing = owned_by(None::<Row>, 1, |r| r.user_id, "trade");
        assert!(matches!(missing, Err(AppError::NotFound("trade"))));

        let foreign = owned_by(Some(Row { user_id: 2 }), 1, |r| r.user_id, "trade");
        assert!(matches!(foreign, Err(AppError::Forbidden("trade"))));

        let mine = owned_by(Some(Row { user_id: 1 }), 1, |r| r.user_id, "trade");
        assert!(mine.is_ok());
    }

    #[test]
    fn server_errors_hide_details() {
        let err = AppError::Internal(anyhow::anyhow!("connection refused"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::Forbidden("note").status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("note").to_string(), "note not found");
        assert_eq!(AppError::Unavailable("File storage").status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
