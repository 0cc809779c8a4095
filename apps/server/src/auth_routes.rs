//! Authentication route handlers
//!
//! This module provides the sign-in endpoints:
//! - `/login` - Start the OIDC flow
//! - `/auth/openid/return` - Provider return (GET query or POST form)
//! - `/logout` - Destroy the local session and sign out at the provider
//!
//! Pending request contexts live in the session, or in one encrypted cookie
//! per context when `use_cookie_instead_of_session` is set.

use auth::{
    logout_redirect_url, AuthError, AuthResult, Authentication, AuthenticationRequestContext,
    AuthorizeOptions, PendingRequests, ReturnParams,
};
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tower_sessions::{cookie::time::Duration, Session};
use tracing::{debug, error, info, warn};

use crate::{
    error::ServerError,
    middleware::{found, SESSION_USER_KEY},
    state::AppState,
};

/// Session key holding the pending request contexts
pub const PENDING_REQUESTS_KEY: &str = "oidc_pending_requests";

/// Name prefix of context cookies
pub const CONTEXT_COOKIE_PREFIX: &str = "oidc-ctx.";

fn context_cookie_name(state: &str) -> String {
    format!("{}{}", CONTEXT_COOKIE_PREFIX, state)
}

fn removal_cookie(name: String) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

/// `GET /login`
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
) -> Result<Response, ServerError> {
    let context = AuthenticationRequestContext::new(AuthorizeOptions {
        resource_url: state.config.resource_url.clone(),
        custom_state: state.config.custom_state.clone(),
        failure_redirect: state.config.failure_redirect.clone(),
    });

    let auth_url = match state.provider.authorization_url(&context) {
        Ok(url) => url,
        Err(e) => {
            error!(error = %e, "Failed to build authorization URL");
            return Ok(found(&state.config.failure_redirect));
        }
    };

    let jar = save_context(&state, &session, jar, context).await?;

    debug!("Redirecting to identity provider");
    Ok((jar, found(&auth_url)).into_response())
}

/// `GET /auth/openid/return` (`response_mode=query`)
pub async fn return_query(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    Query(params): Query<ReturnParams>,
) -> Result<Response, ServerError> {
    complete_return(&state, &session, jar, params).await
}

/// `POST /auth/openid/return` (`response_mode=form_post`)
pub async fn return_form(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    Form(params): Form<ReturnParams>,
) -> Result<Response, ServerError> {
    complete_return(&state, &session, jar, params).await
}

async fn complete_return(
    state: &AppState,
    session: &Session,
    jar: CookieJar,
    params: ReturnParams,
) -> Result<Response, ServerError> {
    let Some(returned_state) = params.state.clone().filter(|s| !s.is_empty()) else {
        warn!("Provider return without state parameter");
        return Ok((jar, found(&state.config.failure_redirect)).into_response());
    };

    let (jar, context) = take_context(state, session, jar, &returned_state).await?;
    let Some(context) = context else {
        let e = AuthError::InvalidState("no pending request for state".to_string());
        warn!(error = %e, "Rejected provider return");
        return Ok((jar, found(&state.config.failure_redirect)).into_response());
    };

    match authenticate(state, &params, &context).await {
        Ok(authentication) => {
            let is_new = authentication.is_new();
            let user = authentication.into_user();

            session.cycle_id().await?;
            session
                .insert(SESSION_USER_KEY, state.serializer.serialize(&user))
                .await?;

            info!(oid = %user.oid, new_user = is_new, "User signed in");
            Ok((jar, found("/")).into_response())
        }
        Err(e) if e.is_authentication_failure() => {
            warn!(error = %e, "Authentication failed");
            Ok((jar, found(&context.failure_redirect)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn authenticate(
    state: &AppState,
    params: &ReturnParams,
    context: &AuthenticationRequestContext,
) -> AuthResult<Authentication> {
    let identity = state.provider.verify_return(params, context).await?;
    state.strategy.verify(&identity).await
}

/// `GET /logout`
///
/// Always ends in a redirect to the provider, even when the local session
/// could not be destroyed.
pub async fn logout(State(state): State<AppState>, session: Session, jar: CookieJar) -> Response {
    let oid = session
        .get::<String>(SESSION_USER_KEY)
        .await
        .ok()
        .flatten();

    if let Err(e) = session.flush().await {
        let e = AuthError::SessionDestroyFailed(e.to_string());
        error!(error = %e, "Failed to destroy session");
    }

    let jar = clear_context_cookies(jar);
    let target = logout_target(&state);

    info!(oid = ?oid, "User signed out");
    (jar, found(&target)).into_response()
}

/// Configured logout URL, else the provider's `end_session_endpoint`, else
/// straight back to `post_logout_redirect_uri`
fn logout_target(state: &AppState) -> String {
    let post_logout = &state.config.post_logout_redirect_uri;
    let Some(endpoint) = state
        .config
        .destroy_session_url
        .as_deref()
        .or_else(|| state.provider.end_session_endpoint())
    else {
        debug!("No provider logout endpoint, skipping provider sign-out");
        return post_logout.clone();
    };

    match logout_redirect_url(endpoint, post_logout) {
        Ok(url) => url,
        Err(e) => {
            error!(error = %e, "Failed to build logout URL");
            endpoint.to_string()
        }
    }
}

async fn save_context(
    state: &AppState,
    session: &Session,
    jar: CookieJar,
    context: AuthenticationRequestContext,
) -> Result<CookieJar, ServerError> {
    let oidc = &state.config.oidc;
    let max_age = oidc.nonce_lifetime_secs();

    let Some(cipher) = &state.cookie_cipher else {
        let mut pending: PendingRequests = session
            .get(PENDING_REQUESTS_KEY)
            .await?
            .unwrap_or_default();
        pending.push(context, max_age, oidc.nonce_max_amount);
        session.insert(PENDING_REQUESTS_KEY, pending).await?;
        return Ok(jar);
    };

    let mut jar = jar;
    let mut live = Vec::new();
    let mut stale = Vec::new();
    for cookie in jar.iter().filter(|c| c.name().starts_with(CONTEXT_COOKIE_PREFIX)) {
        match cipher
            .decrypt_json::<AuthenticationRequestContext>(cookie.value())
            .ok()
            .filter(|ctx| !ctx.is_expired(max_age))
        {
            Some(ctx) => live.push((ctx.created_at, cookie.name().to_string())),
            None => stale.push(cookie.name().to_string()),
        }
    }

    // Oldest contexts go first so the new one fits under the limit
    live.sort();
    let keep = oidc.nonce_max_amount.max(1) - 1;
    let evict = live.len().saturating_sub(keep);
    stale.extend(live.into_iter().take(evict).map(|(_, name)| name));

    for name in stale {
        jar = jar.remove(removal_cookie(name));
    }

    let value = cipher.encrypt_json(&context)?;
    let cookie = Cookie::build((context_cookie_name(&context.state), value))
        .path("/")
        .http_only(true)
        .secure(state.config.cookie_secure())
        .same_site(state.config.cookie_same_site().into())
        .max_age(Duration::seconds(max_age))
        .build();

    Ok(jar.add(cookie))
}

async fn take_context(
    state: &AppState,
    session: &Session,
    jar: CookieJar,
    returned_state: &str,
) -> Result<(CookieJar, Option<AuthenticationRequestContext>), ServerError> {
    let max_age = state.config.oidc.nonce_lifetime_secs();

    let Some(cipher) = &state.cookie_cipher else {
        let mut pending: PendingRequests = session
            .get(PENDING_REQUESTS_KEY)
            .await?
            .unwrap_or_default();
        let context = pending.take(returned_state, max_age);
        session.insert(PENDING_REQUESTS_KEY, pending).await?;
        return Ok((jar, context));
    };

    let name = context_cookie_name(returned_state);
    let context = match jar.get(&name) {
        Some(cookie) => cipher
            .decrypt_json::<AuthenticationRequestContext>(cookie.value())
            .map_err(|e| debug!(error = %e, "Unreadable context cookie"))
            .ok()
            .filter(|ctx| ctx.state == returned_state && !ctx.is_expired(max_age)),
        None => return Ok((jar, None)),
    };

    Ok((jar.remove(removal_cookie(name)), context))
}

fn clear_context_cookies(jar: CookieJar) -> CookieJar {
    let names: Vec<String> = jar
        .iter()
        .filter(|c| c.name().starts_with(CONTEXT_COOKIE_PREFIX))
        .map(|c| c.name().to_string())
        .collect();

    names
        .into_iter()
        .fold(jar, |jar, name| jar.remove(removal_cookie(name)))
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use async_trait::async_trait;
    use auth::{
        CookieEncryptionKey, IdentityProvider, MemoryUserDirectory, UserRepository,
        VerifiedIdentity,
    };
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use tower_sessions::{
        session::{Id, Record},
        session_store, MemoryStore, SessionStore,
    };

    use super::*;
    use crate::{config::ServerConfig, create_app_with_store};

    const PROVIDER_LOGOUT: &str = "https://idp.test.example/logout";

    /// Accepts code `good`, returns a profile without `oid` for `no-oid`,
    /// rejects everything else.
    struct FakeProvider {
        end_session_endpoint: Option<String>,
    }

    impl Default for FakeProvider {
        fn default() -> Self {
            Self {
                end_session_endpoint: Some(PROVIDER_LOGOUT.to_string()),
            }
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        fn authorization_url(&self, context: &AuthenticationRequestContext) -> AuthResult<String> {
            Ok(format!(
                "https://idp.test.example/authorize?state={}&nonce={}",
                context.state, context.nonce
            ))
        }

        async fn verify_return(
            &self,
            params: &ReturnParams,
            context: &AuthenticationRequestContext,
        ) -> AuthResult<VerifiedIdentity> {
            let profile = match params.code.as_deref() {
                Some("good") => json!({ "oid": "abc", "name": "Alice" }),
                Some("no-oid") => json!({ "name": "Bob" }),
                _ => return Err(AuthError::AuthenticationFailed("bad code".to_string())),
            };

            Ok(VerifiedIdentity {
                issuer: "https://idp.test.example".to_string(),
                subject: "subject-1".to_string(),
                profile: profile.as_object().cloned().unwrap_or_default(),
                request_state: context.custom_state.clone(),
                ..Default::default()
            })
        }

        fn end_session_endpoint(&self) -> Option<&str> {
            self.end_session_endpoint.as_deref()
        }
    }

    /// Memory store whose deletes fail once `fail_deletes` is set
    #[derive(Debug, Clone, Default)]
    struct FailingDeleteStore {
        inner: MemoryStore,
        fail_deletes: Arc<AtomicBool>,
    }

    #[async_trait]
    impl SessionStore for FailingDeleteStore {
        async fn create(&self, record: &mut Record) -> session_store::Result<()> {
            self.inner.create(record).await
        }

        async fn save(&self, record: &Record) -> session_store::Result<()> {
            self.inner.save(record).await
        }

        async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
            self.inner.load(session_id).await
        }

        async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
            if self.fail_deletes.load(Ordering::SeqCst) {
                return Err(session_store::Error::Backend("store unavailable".to_string()));
            }
            self.inner.delete(session_id).await
        }
    }

    fn test_config() -> ServerConfig {
        ServerConfig {
            failure_redirect: "/login-failed".to_string(),
            ..ServerConfig::default()
        }
    }

    fn cookie_mode_config() -> ServerConfig {
        let mut config = test_config();
        config.oidc.use_cookie_instead_of_session = true;
        config.oidc.cookie_encryption_keys = vec![CookieEncryptionKey::new(
            "12345678901234567890123456789012",
            "123456789012",
        )];
        config.oidc.nonce_max_amount = 2;
        config
    }

    fn build_app<S>(
        config: ServerConfig,
        provider: FakeProvider,
        store: S,
    ) -> (Router, Arc<MemoryUserDirectory>)
    where
        S: SessionStore + Clone,
    {
        let directory = Arc::new(MemoryUserDirectory::new());
        let state = AppState::new(config, Arc::new(provider), directory.clone()).unwrap();
        (create_app_with_store(state, store), directory)
    }

    fn test_app(config: ServerConfig) -> (Router, Arc<MemoryUserDirectory>) {
        build_app(config, FakeProvider::default(), MemoryStore::default())
    }

    async fn get(app: &Router, uri: &str, cookies: &[String]) -> Response {
        let mut request = Request::builder().uri(uri);
        if !cookies.is_empty() {
            request = request.header(header::COOKIE, cookies.join("; "));
        }
        app.clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post_form(app: &Router, uri: &str, body: String, cookies: &[String]) -> Response {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if !cookies.is_empty() {
            request = request.header(header::COOKIE, cookies.join("; "));
        }
        app.clone()
            .oneshot(request.body(Body::from(body)).unwrap())
            .await
            .unwrap()
    }

    fn location(response: &Response) -> String {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    /// `name=value` pairs the response sets, skipping removals
    fn set_cookies(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .filter(|pair| !pair.ends_with('='))
            .map(String::from)
            .collect()
    }

    fn session_cookie(response: &Response) -> Option<String> {
        set_cookies(response).into_iter().find(|c| c.starts_with("id="))
    }

    fn state_param(location: &str) -> String {
        url::Url::parse(location)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    /// Start a login, returning the session cookie and the state sent to
    /// the provider
    async fn start_login(app: &Router) -> (String, String) {
        let response = get(app, "/login", &[]).await;
        assert_eq!(response.status(), StatusCode::FOUND);

        let location = location(&response);
        assert!(location.starts_with("https://idp.test.example/authorize"));
        (session_cookie(&response).unwrap(), state_param(&location))
    }

    #[tokio::test]
    async fn test_api_requires_login() {
        let (app, _) = test_app(test_config());

        let response = get(&app, "/api", &[]).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn test_full_sign_in_flow() {
        let (app, directory) = test_app(test_config());
        let (cookie, state) = start_login(&app).await;

        let response = post_form(
            &app,
            "/auth/openid/return",
            format!("code=good&state={}", state),
            &[cookie.clone()],
        )
        .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/");

        // Session id is cycled on sign-in
        let signed_in = session_cookie(&response).unwrap();
        assert_ne!(signed_in, cookie);

        let response = get(&app, "/api", &[signed_in.clone()]).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["message"].as_str().unwrap().contains("Alice"));

        let body = json_body(get(&app, "/", &[signed_in.clone()]).await).await;
        assert_eq!(body["authenticated"], true);
        assert_eq!(body["user"]["oid"], "abc");

        assert_eq!(directory.len().await, 1);
        assert_eq!(directory.find("abc").await.unwrap().unwrap().oid, "abc");

        // The pre-login session id no longer authenticates
        let response = get(&app, "/api", &[cookie]).await;
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn test_return_via_query() {
        let (app, _) = test_app(test_config());
        let (cookie, state) = start_login(&app).await;

        let response = get(
            &app,
            &format!("/auth/openid/return?code=good&state={}", state),
            &[cookie],
        )
        .await;
        assert_eq!(location(&response), "/");
        assert!(session_cookie(&response).is_some());
    }

    #[tokio::test]
    async fn test_unknown_state_redirects_to_failure() {
        let (app, directory) = test_app(test_config());
        let (cookie, _) = start_login(&app).await;

        let response = post_form(
            &app,
            "/auth/openid/return",
            "code=good&state=forged".to_string(),
            &[cookie.clone()],
        )
        .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/login-failed");

        let body = json_body(get(&app, "/", &[cookie]).await).await;
        assert_eq!(body["authenticated"], false);
        assert!(directory.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_state_redirects_to_failure() {
        let (app, _) = test_app(test_config());

        let response = post_form(&app, "/auth/openid/return", "code=good".to_string(), &[]).await;
        assert_eq!(location(&response), "/login-failed");
    }

    #[tokio::test]
    async fn test_context_is_single_use() {
        let (app, _) = test_app(test_config());
        let (cookie, state) = start_login(&app).await;

        let first = post_form(
            &app,
            "/auth/openid/return",
            format!("code=bad&state={}", state),
            &[cookie.clone()],
        )
        .await;
        assert_eq!(location(&first), "/login-failed");

        let replay = post_form(
            &app,
            "/auth/openid/return",
            format!("code=good&state={}", state),
            &[cookie],
        )
        .await;
        assert_eq!(location(&replay), "/login-failed");
    }

    #[tokio::test]
    async fn test_missing_oid_fails_without_registering() {
        let (app, directory) = test_app(test_config());
        let (cookie, state) = start_login(&app).await;

        let response = post_form(
            &app,
            "/auth/openid/return",
            format!("code=no-oid&state={}", state),
            &[cookie.clone()],
        )
        .await;
        assert_eq!(location(&response), "/login-failed");
        assert!(directory.is_empty().await);

        let response = get(&app, "/api", &[cookie]).await;
        assert_eq!(location(&response), "/login");
    }

    /// Sign in with code `good`, returning the signed-in session cookie
    async fn sign_in(app: &Router) -> String {
        let (cookie, state) = start_login(app).await;
        let response = post_form(
            app,
            "/auth/openid/return",
            format!("code=good&state={}", state),
            &[cookie],
        )
        .await;
        assert_eq!(location(&response), "/");
        session_cookie(&response).unwrap()
    }

    #[tokio::test]
    async fn test_form_post_cookies_are_cross_site() {
        let (app, _) = test_app(test_config());

        let response = get(&app, "/login", &[]).await;
        let session = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("id="))
            .unwrap()
            .to_string();
        assert!(session.contains("SameSite=None"));
        assert!(session.contains("Secure"));
    }

    #[tokio::test]
    async fn test_logout_redirects_to_discovered_endpoint() {
        let (app, _) = test_app(test_config());
        let signed_in = sign_in(&app).await;

        let response = get(&app, "/logout", &[signed_in.clone()]).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            location(&response),
            "https://idp.test.example/logout?post_logout_redirect_uri=http%3A%2F%2Flocalhost%3A3000"
        );

        let response = get(&app, "/api", &[signed_in]).await;
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn test_logout_prefers_configured_url() {
        let mut config = test_config();
        config.destroy_session_url =
            Some("https://login.microsoftonline.com/common/oauth2/logout".to_string());
        let (app, _) = test_app(config);

        let response = get(&app, "/logout", &[]).await;
        assert_eq!(
            location(&response),
            "https://login.microsoftonline.com/common/oauth2/logout?post_logout_redirect_uri=http%3A%2F%2Flocalhost%3A3000"
        );
    }

    #[tokio::test]
    async fn test_logout_without_provider_endpoint() {
        let provider = FakeProvider {
            end_session_endpoint: None,
        };
        let (app, _) = build_app(test_config(), provider, MemoryStore::default());

        let response = get(&app, "/logout", &[]).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "http://localhost:3000");
    }

    #[tokio::test]
    async fn test_logout_without_session() {
        let (app, _) = test_app(test_config());

        let response = get(&app, "/logout", &[]).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(location(&response).contains("post_logout_redirect_uri="));
    }

    #[tokio::test]
    async fn test_logout_survives_session_store_failure() {
        let store = FailingDeleteStore::default();
        let fail_deletes = store.fail_deletes.clone();
        let (app, _) = build_app(test_config(), FakeProvider::default(), store);

        // Sign-in cycles the session id, which deletes through the store
        let signed_in = sign_in(&app).await;
        fail_deletes.store(true, Ordering::SeqCst);

        let response = get(&app, "/logout", &[signed_in]).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            location(&response),
            "https://idp.test.example/logout?post_logout_redirect_uri=http%3A%2F%2Flocalhost%3A3000"
        );
    }

    #[tokio::test]
    async fn test_cookie_mode_sign_in() {
        let (app, directory) = test_app(cookie_mode_config());

        let response = get(&app, "/login", &[]).await;
        let state = state_param(&location(&response));
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].starts_with(&context_cookie_name(&state)));

        let response = post_form(
            &app,
            "/auth/openid/return",
            format!("code=good&state={}", state),
            &cookies,
        )
        .await;
        assert_eq!(location(&response), "/");
        assert_eq!(directory.len().await, 1);

        let removed = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.starts_with(&format!("{}=;", context_cookie_name(&state))));
        assert!(removed);

        let signed_in = session_cookie(&response).unwrap();
        let response = get(&app, "/api", &[signed_in]).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cookie_mode_rejects_tampered_context() {
        let (app, directory) = test_app(cookie_mode_config());

        let response = get(&app, "/login", &[]).await;
        let state = state_param(&location(&response));

        let forged = format!("{}=not-a-valid-ciphertext", context_cookie_name(&state));
        let response = post_form(
            &app,
            "/auth/openid/return",
            format!("code=good&state={}", state),
            &[forged],
        )
        .await;
        assert_eq!(location(&response), "/login-failed");
        assert!(directory.is_empty().await);
    }

    #[tokio::test]
    async fn test_cookie_mode_evicts_oldest_context() {
        let (app, _) = test_app(cookie_mode_config());

        let mut jar: Vec<String> = Vec::new();
        for _ in 0..3 {
            let response = get(&app, "/login", &jar).await;
            jar.extend(set_cookies(&response));
            let removed: Vec<String> = response
                .headers()
                .get_all(header::SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .filter_map(|v| v.split(';').next())
                .filter(|pair| pair.ends_with('='))
                .map(|pair| pair.trim_end_matches('=').to_string())
                .collect();
            jar.retain(|c| !removed.iter().any(|name| c.starts_with(&format!("{}=", name))));
        }

        // nonce_max_amount = 2
        assert_eq!(jar.len(), 2);
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = test_app(test_config());
        let response = get(&app, "/health", &[]).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
