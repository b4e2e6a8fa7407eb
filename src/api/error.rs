//! Maps domain and authorization failures onto HTTP responses.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::domain::DomainError;
use crate::infrastructure::auth::login_redirect_url;

#[derive(Debug)]
pub enum ApiError {
    Domain(DomainError),
    /// Anonymous caller on a login-protected page; carries the path to return to
    LoginRequired { next: String },
    /// Authenticated but lacking the required capability
    Forbidden,
    /// Bad credentials on login
    Unauthorized(String),
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError::Domain(e)
    }
}

/// A 302 redirect, the status the catalog's browser-facing flows use.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

pub fn domain_error_status(e: &DomainError) -> StatusCode {
    match e {
        DomainError::NotFound => StatusCode::NOT_FOUND,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Protected(_) => StatusCode::CONFLICT,
        DomainError::Database(_) | DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::LoginRequired { next } => found(&login_redirect_url(&next)),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "You do not have permission to perform this action." })),
            )
                .into_response(),
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::Domain(e) => {
                let status = domain_error_status(&e);
                match e {
                    DomainError::Validation(errors) => {
                        (status, Json(json!({ "errors": errors }))).into_response()
                    }
                    DomainError::NotFound => {
                        (status, Json(json!({ "error": "Not found" }))).into_response()
                    }
                    DomainError::Protected(msg) => {
                        (status, Json(json!({ "error": msg }))).into_response()
                    }
                    other => {
                        tracing::error!("{}", other);
                        (status, Json(json!({ "error": "Internal server error" }))).into_response()
                    }
                }
            }
        }
    }
}
