//! Server error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Faults that end the current request with a 500.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Authentication backend error.
    #[error("Auth error: {0}")]
    Auth(#[from] auth::AuthError),

    /// Session store error.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let code = match &self {
            ServerError::Auth(_) => "AUTH_ERROR",
            ServerError::Session(_) => "SESSION_ERROR",
        };

        tracing::error!(code, error = %self, "Request failed");

        let body = json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        });

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
