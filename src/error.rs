use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{response::ErrorBody, validation::FieldErrors};

pub const PERMISSION_DENIED: &str = "You do not have permission to perform this action.";
pub const NOT_AUTHENTICATED: &str = "Authentication credentials were not provided.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found() -> Self {
        AppError::NotFound("Not found.".into())
    }

    pub fn unauthenticated() -> Self {
        AppError::Unauthorized(NOT_AUTHENTICATED.into())
    }

    pub fn field(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation(FieldErrors::single(field, message))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::Validation(errors) => (status, axum::Json(errors)).into_response(),
            AppError::NotFound(detail)
            | AppError::Unauthorized(detail)
            | AppError::BadRequest(detail) => {
                (status, axum::Json(ErrorBody::new(detail))).into_response()
            }
            AppError::Forbidden => {
                (status, axum::Json(ErrorBody::new(PERMISSION_DENIED))).into_response()
            }
            AppError::DbError(err) => internal(status, &err),
            AppError::OrmError(err) => internal(status, &err),
            AppError::Internal(err) => internal(status, err.as_ref()),
        }
    }
}

fn internal(status: StatusCode, err: &dyn std::error::Error) -> Response {
    tracing::error!(error = %err, "request failed");
    (status, axum::Json(ErrorBody::new("Internal server error."))).into_response()
}

pub type AppResult<T> = Result<T, AppError>;
