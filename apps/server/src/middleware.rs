//! Authentication middleware

use auth::UserProfile;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::debug;

use crate::{error::ServerError, state::AppState};

/// Session key holding the signed-in user's `oid`
pub const SESSION_USER_KEY: &str = "user_oid";

/// The signed-in user, inserted into request extensions by
/// [`ensure_authenticated`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserProfile);

/// Resolve the session's user, if any.
///
/// A session pointing at a user the directory no longer knows is treated as
/// anonymous and its identifier is dropped.
pub async fn current_user(
    state: &AppState,
    session: &Session,
) -> Result<Option<UserProfile>, ServerError> {
    let Some(oid) = session.get::<String>(SESSION_USER_KEY).await? else {
        return Ok(None);
    };

    let user = state.serializer.deserialize(&oid).await?;
    if user.is_none() {
        debug!(oid = %oid, "Session refers to unknown user");
        session.remove::<String>(SESSION_USER_KEY).await?;
    }
    Ok(user)
}

/// Require a signed-in user, redirecting anonymous requests to `/login`
pub async fn ensure_authenticated(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    match current_user(&state, &session).await? {
        Some(user) => {
            debug!(oid = %user.oid, "Authenticated user");
            request.extensions_mut().insert(CurrentUser(user));
            Ok(next.run(request).await)
        }
        None => {
            debug!(path = %request.uri().path(), "No signed-in user, redirecting to login");
            Ok(found("/login"))
        }
    }
}

/// `302 Found` to `location`
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
