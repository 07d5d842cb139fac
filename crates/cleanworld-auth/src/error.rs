//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Errors raised by the authentication subsystem.
///
/// The token variants (`TokenInvalid`, `TokenExpired`, `TokenTampered`)
/// exist so the filter can log the sub-reason; clients always see the
/// same opaque 401 regardless of which one occurred.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Malformed or unparseable token")]
    TokenInvalid,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token signature mismatch")]
    TokenTampered,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            // All token failures collapse to one outward rejection
            AuthError::TokenInvalid | AuthError::TokenExpired | AuthError::TokenTampered => {
                (StatusCode::UNAUTHORIZED, "Unauthorized")
            }
            AuthError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            AuthError::PasswordHash(_) | AuthError::Jwt(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        };

        let body = axum::Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
