//! OIDC sample web app server
//!
//! The server handles:
//! - Sign-in through an OpenID Connect provider
//! - Server-side sessions holding the signed-in user
//! - A protected API behind [`middleware::ensure_authenticated`]
//! - Sign-out at the provider

use axum::{
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, SessionStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod auth_routes;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::ServerError;
pub use state::AppState;

/// Build the application router with in-memory sessions
pub fn create_app(state: AppState) -> Router {
    create_app_with_store(state, MemoryStore::default())
}

/// Build the application router on top of a session store
pub fn create_app_with_store<S>(state: AppState, store: S) -> Router
where
    S: SessionStore + Clone,
{
    let config = &state.config;
    let session_layer = SessionManagerLayer::new(store)
        .with_secure(config.cookie_secure())
        .with_same_site(config.cookie_same_site().into())
        .with_expiry(Expiry::OnInactivity(config.session.max_age()));

    let protected = Router::new()
        .route("/api", get(routes::api))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::ensure_authenticated,
        ));

    Router::new()
        .route("/", get(routes::index))
        .route("/login", get(auth_routes::login))
        .route(
            "/auth/openid/return",
            get(auth_routes::return_query).post(auth_routes::return_form),
        )
        .route("/logout", get(auth_routes::logout))
        .route("/health", get(routes::health_check))
        .merge(protected)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize tracing
///
/// `RUST_LOG` wins when set; otherwise the server logs at `log_level` and
/// the auth crate at `auth_log_level`.
pub fn init_tracing(log_level: &str, auth_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "oidc_webapp_server={},auth={},tower_http=debug",
                    log_level, auth_log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
