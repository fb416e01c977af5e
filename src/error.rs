use axum::{
    extract::rejection::PathRejection,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::store::StoreError;

/// Failure of a request handler, rendered at the handler boundary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    /// Bad credentials on login or password change.
    #[error("{0}")]
    Auth(String),

    /// No valid session. Page routes redirect to the login page,
    /// `/api` routes answer 401.
    #[error("authentication required")]
    Unauthenticated { api: bool },

    /// Absent or owned by someone else; the two are not distinguished.
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Unauthenticated { api: true } => StatusCode::UNAUTHORIZED,
            AppError::Unauthenticated { api: false } => StatusCode::SEE_OTHER,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::Conflict(_) => "conflict",
            AppError::Auth(_) => "invalid_credentials",
            AppError::Unauthenticated { .. } => "unauthenticated",
            AppError::NotFound(_) => "not_found",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(what) => AppError::Conflict(format!("{what} already exists")),
            StoreError::Backend(e) => AppError::Internal(e),
        }
    }
}

/// Ids in the path are integers; anything else names no resource.
impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        AppError::not_found("Page not found")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Unauthenticated { api: false } => {
                return Redirect::to("/login").into_response();
            }
            AppError::Unauthenticated { api: true } => "Please log in first!".to_string(),
            AppError::Internal(e) => {
                error!(error = %e, "request failed");
                "Server error".to_string()
            }
            other => other.to_string(),
        };
        let body = json!({ "error": self.code(), "message": message });
        (self.status_code(), Json(body)).into_response()
    }
}
