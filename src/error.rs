use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::auth::repo::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Email already exists")]
    EmailTaken,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Not Found")]
    NotFound,
    /// Control-flow signal, not a failure: answer with 302 to the location.
    #[error("redirect to {0}")]
    Redirect(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn redirect(location: impl Into<String>) -> Self {
        AppError::Redirect(location.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidCredentials | AppError::EmailTaken => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Redirect(_) => StatusCode::FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Errors a user can fix by resubmitting the form they came from.
    pub fn is_form_error(&self) -> bool {
        self.status() == StatusCode::BAD_REQUEST
    }

    /// Page loaders report any failure as a generic 401, except explicit
    /// response signals (redirect, not found) which pass through untouched.
    pub fn into_loader_error(self) -> Self {
        match self {
            AppError::Redirect(_) | AppError::NotFound => self,
            other => {
                if let AppError::Internal(e) = &other {
                    error!(error = %e, "loader failed");
                }
                AppError::Unauthorized
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AppError::EmailTaken,
            StoreError::Database(e) => AppError::Internal(e.into()),
        }
    }
}

pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Redirect(location) = &self {
            return found(location);
        }
        if let AppError::Internal(e) = &self {
            error!(error = %e, "internal error");
        }
        (self.status(), self.to_string()).into_response()
    }
}
