use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::auth::jwt::TokenError;

pub const GENERIC_FAILURE: &str = "Something went wrong. Please try after some time";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("email already exists")]
    DuplicateEmail,

    /// Wrong password and unknown email alike.
    #[error("invalid login credentials")]
    AuthFailed,

    /// Missing, invalid or expired session token, or a deleted subject.
    #[error("unauthorized")]
    Unauthorized,

    #[error("user not found")]
    NotFound,

    #[error("new password is the same as the current one")]
    SamePassword,

    #[error("password hashing error: {0}")]
    Hashing(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<TokenError> for AppError {
    fn from(_: TokenError) -> Self {
        AppError::Unauthorized
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::SamePassword => StatusCode::BAD_REQUEST,
            AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::AuthFailed | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Hashing(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// What the caller sees. Infrastructure detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::DuplicateEmail => "Email already exists".into(),
            AppError::AuthFailed => "Invalid login credentials".into(),
            AppError::Unauthorized => "Invalid or expired token".into(),
            AppError::NotFound => "User not found".into(),
            AppError::SamePassword => "New password should not be same as old password".into(),
            AppError::Hashing(_) | AppError::Database(_) | AppError::Internal(_) => {
                GENERIC_FAILURE.into()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = Json(ErrorBody {
            message: self.public_message(),
        });
        (status, body).into_response()
    }
}
