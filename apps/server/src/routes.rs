//! Application pages

use auth::UserProfile;
use axum::{extract::State, Extension, Json};
use serde::Serialize;
use tower_sessions::Session;

use crate::{
    error::ServerError,
    middleware::{current_user, CurrentUser},
    state::AppState,
};

/// Home page payload
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub authenticated: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

/// Protected API payload
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub message: String,
}

/// `GET /`
pub async fn index(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<IndexResponse>, ServerError> {
    let user = current_user(&state, &session).await?;

    Ok(Json(IndexResponse {
        authenticated: user.is_some(),
        user,
    }))
}

/// `GET /api`, behind `ensure_authenticated`
pub async fn api(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<ApiResponse> {
    Json(ApiResponse {
        message: format!("Hello {}, this is a protected resource", user.display()),
    })
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}
