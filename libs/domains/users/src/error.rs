use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_helpers::errors::{AppError, ErrorCode, ErrorResponse, error_response, validation_details};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("email already exists")]
    DuplicateEmail,

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Request(#[from] AppError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl From<DbErr> for UserError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => UserError::DuplicateEmail,
            _ => UserError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        match self {
            UserError::NotFound => {
                error_response(StatusCode::NOT_FOUND, "User not found", ErrorCode::NotFound)
            }
            UserError::DuplicateEmail => error_response(
                StatusCode::BAD_REQUEST,
                "email already exists",
                ErrorCode::Conflict,
            ),
            UserError::Validation(errors) => {
                let body = ErrorResponse::new(
                    ErrorCode::ValidationError,
                    ErrorCode::ValidationError.default_message(),
                )
                .with_details(validation_details(&errors));
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            UserError::Request(err) => err.into_response(),
            UserError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InternalError.default_message(),
                    ErrorCode::InternalError,
                )
            }
        }
    }
}
