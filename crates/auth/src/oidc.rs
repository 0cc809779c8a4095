//! OpenID Connect (OIDC) integration
//!
//! This module holds the client configuration, the [`IdentityProvider`]
//! seam the web layer talks to, and [`OidcClient`], the implementation that
//! speaks to a real provider: discovery, authorization URLs, code
//! redemption and ID token validation against the provider's JWKS.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode_header, Algorithm, DecodingKey};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::id_token::{
    validate_id_token, verify_hash_claim, verify_required_hash_claim, IdTokenExpectations,
    PROVIDER_ALGORITHMS,
};
use crate::{AuthError, AuthResult, AuthenticationRequestContext, CookieEncryptionKey, VerifiedIdentity};

/// Default nonce lifetime in seconds.
pub const DEFAULT_NONCE_LIFETIME_SECS: u64 = 3600;

/// Default number of pending requests kept per session.
pub const DEFAULT_NONCE_MAX_AMOUNT: usize = 10;

/// Default allowed clock skew in seconds.
pub const DEFAULT_CLOCK_SKEW_SECS: u64 = 300;

/// Upper bound for cookie-backed lifetimes (browsers cap cookies at 400 days).
pub const MAX_COOKIE_LIFETIME_SECS: u64 = 400 * 24 * 60 * 60;

/// Minimum time between two JWKS fetches triggered by unknown key ids.
pub const JWKS_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

const REQUIRED_SCOPES: [&str; 2] = ["openid", "profile"];
const LOGGING_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Which artifacts the provider returns to the redirect URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResponseType {
    /// Authorization code flow
    Code,
    /// Hybrid flow, written `code id_token`
    #[default]
    CodeIdToken,
    /// Hybrid flow, written `id_token code`
    IdTokenCode,
    /// Implicit flow returning only an ID token
    IdToken,
}

impl ResponseType {
    /// Returns the string representation for OAuth parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::CodeIdToken => "code id_token",
            Self::IdTokenCode => "id_token code",
            Self::IdToken => "id_token",
        }
    }

    /// Returns true if an authorization code comes back
    pub fn includes_code(&self) -> bool {
        !matches!(self, Self::IdToken)
    }

    /// Returns true if an ID token comes back on the front channel
    pub fn includes_id_token(&self) -> bool {
        !matches!(self, Self::Code)
    }
}

impl FromStr for ResponseType {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "code" => Ok(Self::Code),
            "code id_token" => Ok(Self::CodeIdToken),
            "id_token code" => Ok(Self::IdTokenCode),
            "id_token" => Ok(Self::IdToken),
            other => Err(AuthError::Configuration(format!(
                "unsupported response_type `{}`",
                other
            ))),
        }
    }
}

impl TryFrom<String> for ResponseType {
    type Error = AuthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResponseType> for String {
    fn from(value: ResponseType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the provider delivers the response to the redirect URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// POSTed as an HTML form
    #[default]
    FormPost,
    /// Appended to the redirect URL query string
    Query,
}

impl ResponseMode {
    /// Returns the string representation for OAuth parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FormPost => "form_post",
            Self::Query => "query",
        }
    }
}

impl FromStr for ResponseMode {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "form_post" => Ok(Self::FormPost),
            "query" => Ok(Self::Query),
            other => Err(AuthError::Configuration(format!(
                "unsupported response_mode `{}`",
                other
            ))),
        }
    }
}

/// OpenID Connect client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcConfig {
    /// Discovery document URL
    #[serde(default)]
    pub identity_metadata: String,

    /// OAuth2 client ID
    #[serde(default)]
    pub client_id: String,

    /// OAuth2 client secret (required when a code is redeemed)
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Requested response type
    #[serde(default)]
    pub response_type: ResponseType,

    /// Requested response mode
    #[serde(default)]
    pub response_mode: ResponseMode,

    /// Redirect URL registered with the provider
    #[serde(default)]
    pub redirect_url: String,

    /// Allow a plain-http redirect URL (development only)
    #[serde(default)]
    pub allow_http_for_redirect_url: bool,

    /// Check the `iss` claim
    #[serde(default = "default_true")]
    pub validate_issuer: bool,

    /// Accepted issuers; defaults to the discovered issuer
    #[serde(default)]
    pub issuer: Vec<String>,

    /// Hand the request's custom state to the verification step
    #[serde(default)]
    pub pass_req_to_callback: bool,

    /// Keep request contexts in encrypted cookies instead of the session
    #[serde(default)]
    pub use_cookie_instead_of_session: bool,

    /// Ordered cookie keys; the first encrypts, all decrypt
    #[serde(default)]
    pub cookie_encryption_keys: Vec<CookieEncryptionKey>,

    /// Scopes to request (`openid` and `profile` are always added)
    #[serde(default = "default_scopes")]
    pub scope: Vec<String>,

    /// Log level for this crate (trace, debug, info, warn, error)
    #[serde(default = "default_logging_level")]
    pub logging_level: String,

    /// Seconds a pending request stays valid
    #[serde(default = "default_nonce_lifetime")]
    pub nonce_lifetime: u64,

    /// Maximum pending requests per session
    #[serde(default = "default_nonce_max_amount")]
    pub nonce_max_amount: usize,

    /// Allowed clock skew in seconds
    #[serde(default = "default_clock_skew")]
    pub clock_skew: u64,
}

fn default_true() -> bool {
    true
}

fn default_scopes() -> Vec<String> {
    REQUIRED_SCOPES.iter().map(|s| s.to_string()).collect()
}

fn default_logging_level() -> String {
    "warn".to_string()
}

fn default_nonce_lifetime() -> u64 {
    DEFAULT_NONCE_LIFETIME_SECS
}

fn default_nonce_max_amount() -> usize {
    DEFAULT_NONCE_MAX_AMOUNT
}

fn default_clock_skew() -> u64 {
    DEFAULT_CLOCK_SKEW_SECS
}

impl Default for OidcConfig {
    fn default() -> Self {
        Self {
            identity_metadata: String::new(),
            client_id: String::new(),
            client_secret: None,
            response_type: ResponseType::default(),
            response_mode: ResponseMode::default(),
            redirect_url: String::new(),
            allow_http_for_redirect_url: false,
            validate_issuer: true,
            issuer: Vec::new(),
            pass_req_to_callback: false,
            use_cookie_instead_of_session: false,
            cookie_encryption_keys: Vec::new(),
            scope: default_scopes(),
            logging_level: default_logging_level(),
            nonce_lifetime: default_nonce_lifetime(),
            nonce_max_amount: default_nonce_max_amount(),
            clock_skew: default_clock_skew(),
        }
    }
}

impl OidcConfig {
    /// Create a new OIDC configuration
    pub fn new(
        identity_metadata: impl Into<String>,
        client_id: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            identity_metadata: identity_metadata.into(),
            client_id: client_id.into(),
            redirect_url: redirect_url.into(),
            ..Self::default()
        }
    }

    /// Set the client secret
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Set the response type and mode
    pub fn with_response(mut self, response_type: ResponseType, response_mode: ResponseMode) -> Self {
        self.response_type = response_type;
        self.response_mode = response_mode;
        self
    }

    /// Requested scopes, always including `openid` and `profile`
    pub fn scopes(&self) -> Vec<String> {
        let mut scopes: Vec<String> = REQUIRED_SCOPES
            .iter()
            .filter(|required| !self.scope.iter().any(|s| s == *required))
            .map(|s| s.to_string())
            .collect();
        scopes.extend(self.scope.iter().cloned());
        scopes
    }

    /// `nonce_lifetime` as signed seconds, for timestamp arithmetic
    pub fn nonce_lifetime_secs(&self) -> i64 {
        i64::try_from(self.nonce_lifetime.min(MAX_COOKIE_LIFETIME_SECS)).unwrap_or(i64::MAX)
    }

    /// Returns true if the metadata URL is a multi-tenant endpoint
    pub fn is_multi_tenant(&self) -> bool {
        ["/common/", "/organizations/", "/consumers/"]
            .iter()
            .any(|segment| self.identity_metadata.contains(segment))
    }

    /// Validate the configuration
    pub fn validate(&self) -> AuthResult<()> {
        let metadata = url::Url::parse(&self.identity_metadata).map_err(|e| {
            AuthError::Configuration(format!("invalid identity_metadata: {}", e))
        })?;
        if metadata.scheme() != "https" {
            return Err(AuthError::Configuration(
                "identity_metadata must use https".to_string(),
            ));
        }

        if self.client_id.trim().is_empty() {
            return Err(AuthError::Configuration("client_id is required".to_string()));
        }

        let redirect = url::Url::parse(&self.redirect_url)
            .map_err(|e| AuthError::Configuration(format!("invalid redirect_url: {}", e)))?;
        match redirect.scheme() {
            "https" => {}
            "http" if self.allow_http_for_redirect_url => {}
            _ => {
                return Err(AuthError::Configuration(
                    "redirect_url must use https unless allow_http_for_redirect_url is set"
                        .to_string(),
                ))
            }
        }

        if self.response_mode == ResponseMode::Query && self.response_type != ResponseType::Code {
            return Err(AuthError::Configuration(format!(
                "response_mode query is only allowed with response_type code, not `{}`",
                self.response_type
            )));
        }

        if self.response_type.includes_code()
            && self.client_secret.as_deref().is_none_or(|s| s.is_empty())
        {
            return Err(AuthError::Configuration(format!(
                "client_secret is required for response_type `{}`",
                self.response_type
            )));
        }

        if self.use_cookie_instead_of_session {
            if self.cookie_encryption_keys.is_empty() {
                return Err(AuthError::Configuration(
                    "cookie_encryption_keys are required when use_cookie_instead_of_session is set"
                        .to_string(),
                ));
            }
            for key in &self.cookie_encryption_keys {
                key.validate()?;
            }
        }

        if self.validate_issuer && self.issuer.is_empty() && self.is_multi_tenant() {
            return Err(AuthError::Configuration(
                "issuer is required when validating issuers against a multi-tenant endpoint"
                    .to_string(),
            ));
        }

        if !LOGGING_LEVELS.contains(&self.logging_level.as_str()) {
            return Err(AuthError::Configuration(format!(
                "unsupported logging_level `{}`",
                self.logging_level
            )));
        }

        if self.nonce_lifetime == 0 || self.nonce_lifetime > MAX_COOKIE_LIFETIME_SECS {
            return Err(AuthError::Configuration(format!(
                "nonce_lifetime must be between 1 and {} seconds",
                MAX_COOKIE_LIFETIME_SECS
            )));
        }

        if self.nonce_max_amount == 0 {
            return Err(AuthError::Configuration(
                "nonce_max_amount must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// OIDC provider metadata (subset of fields we need)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcProviderMetadata {
    /// The issuer identifier
    pub issuer: String,

    /// URL of the authorization endpoint
    pub authorization_endpoint: String,

    /// URL of the token endpoint
    pub token_endpoint: String,

    /// URL of the JWKS endpoint
    pub jwks_uri: String,

    /// URL of the end session (logout) endpoint
    #[serde(default)]
    pub end_session_endpoint: Option<String>,

    /// Supported response types
    #[serde(default)]
    pub response_types_supported: Vec<String>,

    /// Supported response modes
    #[serde(default)]
    pub response_modes_supported: Vec<String>,
}

/// Token response from the OIDC provider
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// The access token
    pub access_token: String,

    /// Token type (usually "Bearer")
    #[serde(default)]
    pub token_type: Option<String>,

    /// When the token expires (in seconds)
    #[serde(default)]
    pub expires_in: Option<u64>,

    /// The refresh token (if granted)
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// The ID token (JWT containing user claims)
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Parameters the provider sends to the redirect URL
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReturnParams {
    /// Authorization code
    #[serde(default)]
    pub code: Option<String>,

    /// ID token
    #[serde(default)]
    pub id_token: Option<String>,

    /// State echoed back from the authorization request
    #[serde(default)]
    pub state: Option<String>,

    /// Error code from the provider
    #[serde(default)]
    pub error: Option<String>,

    /// Human-readable error description
    #[serde(default)]
    pub error_description: Option<String>,
}

/// The protocol half of sign-in, as seen by the web layer
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Build the URL that sends the browser to the provider
    fn authorization_url(&self, context: &AuthenticationRequestContext) -> AuthResult<String>;

    /// Validate the provider's response for `context` and extract the identity
    async fn verify_return(
        &self,
        params: &ReturnParams,
        context: &AuthenticationRequestContext,
    ) -> AuthResult<VerifiedIdentity>;

    /// Discovered logout endpoint, if the provider advertises one
    fn end_session_endpoint(&self) -> Option<&str> {
        None
    }
}

/// Build the provider logout URL carrying `post_logout_redirect_uri`
pub fn logout_redirect_url(destroy_session_url: &str, post_logout_redirect_uri: &str) -> AuthResult<String> {
    let mut url = url::Url::parse(destroy_session_url)
        .map_err(|e| AuthError::Configuration(format!("invalid destroy_session_url: {}", e)))?;
    url.query_pairs_mut()
        .append_pair("post_logout_redirect_uri", post_logout_redirect_uri);
    Ok(url.to_string())
}

/// Fetch and sanity-check a discovery document
pub async fn fetch_provider_metadata(
    http: &reqwest::Client,
    discovery_url: &str,
) -> AuthResult<OidcProviderMetadata> {
    let response = http.get(discovery_url).send().await?;
    if !response.status().is_success() {
        return Err(AuthError::Oidc(format!(
            "OIDC discovery failed with status: {}",
            response.status()
        )));
    }

    let metadata: OidcProviderMetadata = response.json().await?;
    if metadata.issuer.trim().is_empty()
        || metadata.authorization_endpoint.trim().is_empty()
        || metadata.token_endpoint.trim().is_empty()
        || metadata.jwks_uri.trim().is_empty()
    {
        return Err(AuthError::Oidc(
            "discovery document is missing mandatory fields".to_string(),
        ));
    }

    Ok(metadata)
}

/// Fetch the provider's signing keys
pub async fn fetch_jwks(http: &reqwest::Client, jwks_uri: &str) -> AuthResult<JwkSet> {
    let response = http.get(jwks_uri).send().await?;
    if !response.status().is_success() {
        return Err(AuthError::Oidc(format!(
            "JWKS fetch failed with status: {}",
            response.status()
        )));
    }
    Ok(response.json().await?)
}

/// Signing keys and when they were last fetched
#[derive(Debug)]
struct KeyCache {
    keys: JwkSet,
    fetched_at: Option<Instant>,
}

impl KeyCache {
    fn refresh_allowed(&self) -> bool {
        self.fetched_at
            .is_none_or(|at| at.elapsed() >= JWKS_REFRESH_INTERVAL)
    }
}

/// OIDC client backed by a discovered provider
#[derive(Debug)]
pub struct OidcClient {
    config: OidcConfig,
    metadata: OidcProviderMetadata,
    jwks: RwLock<KeyCache>,
    http: reqwest::Client,
}

impl OidcClient {
    /// Validate the configuration and discover the provider
    pub async fn discover(config: OidcConfig) -> AuthResult<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        let metadata = fetch_provider_metadata(&http, &config.identity_metadata).await?;
        let jwks = fetch_jwks(&http, &metadata.jwks_uri).await?;

        info!(
            issuer = %metadata.issuer,
            keys = jwks.keys.len(),
            "OIDC provider metadata discovered"
        );

        Ok(Self {
            config,
            metadata,
            jwks: RwLock::new(KeyCache {
                keys: jwks,
                fetched_at: Some(Instant::now()),
            }),
            http,
        })
    }

    /// Build a client from already known metadata and keys
    ///
    /// The first unknown key id may refresh the key set right away.
    pub fn with_metadata(config: OidcConfig, metadata: OidcProviderMetadata, jwks: JwkSet) -> Self {
        Self {
            config,
            metadata,
            jwks: RwLock::new(KeyCache {
                keys: jwks,
                fetched_at: None,
            }),
            http: reqwest::Client::new(),
        }
    }

    /// Get the current configuration
    pub fn config(&self) -> &OidcConfig {
        &self.config
    }

    /// Get the provider metadata
    pub fn metadata(&self) -> &OidcProviderMetadata {
        &self.metadata
    }

    fn expected_issuers(&self) -> Option<Vec<String>> {
        if !self.config.validate_issuer {
            return None;
        }
        if self.config.issuer.is_empty() {
            Some(vec![self.metadata.issuer.clone()])
        } else {
            Some(self.config.issuer.clone())
        }
    }

    /// Find the key for `kid`.
    ///
    /// An unknown `kid` refreshes the key set, at most once per
    /// [`JWKS_REFRESH_INTERVAL`].
    async fn decoding_key(&self, kid: Option<&str>) -> AuthResult<DecodingKey> {
        let no_key =
            || AuthError::AuthenticationFailed("no matching signing key for ID token".to_string());

        if let Some(key) = lookup_key(&self.jwks.read().await.keys, kid)? {
            return Ok(key);
        }

        let mut cache = self.jwks.write().await;
        // Another request may have refreshed while we waited for the lock
        if let Some(key) = lookup_key(&cache.keys, kid)? {
            return Ok(key);
        }
        if !cache.refresh_allowed() {
            debug!(kid = ?kid, "Unknown signing key, JWKS refreshed recently");
            return Err(no_key());
        }

        debug!(kid = ?kid, "Signing key not cached, refreshing JWKS");
        cache.fetched_at = Some(Instant::now());
        cache.keys = fetch_jwks(&self.http, &self.metadata.jwks_uri).await?;

        lookup_key(&cache.keys, kid)?.ok_or_else(no_key)
    }

    /// Validate an ID token, returning its claims and signing algorithm
    async fn validate(
        &self,
        id_token: &str,
        nonce: &str,
    ) -> AuthResult<(Map<String, Value>, Algorithm)> {
        let header = decode_header(id_token)?;
        let key = self.decoding_key(header.kid.as_deref()).await?;
        let issuers = self.expected_issuers();

        let expected = IdTokenExpectations {
            client_id: &self.config.client_id,
            issuers: issuers.as_deref(),
            nonce,
            clock_skew_secs: self.config.clock_skew,
            algorithms: PROVIDER_ALGORITHMS,
        };
        let claims = validate_id_token(id_token, &key, &expected)?;
        Ok((claims, header.alg))
    }

    /// Exchange an authorization code at the token endpoint
    async fn redeem_code(
        &self,
        code: &str,
        context: &AuthenticationRequestContext,
    ) -> AuthResult<TokenResponse> {
        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("client_id", self.config.client_id.as_str()),
        ];
        if let Some(secret) = self.config.client_secret.as_deref() {
            params.push(("client_secret", secret));
        }
        if let Some(resource) = context.resource_url.as_deref() {
            params.push(("resource", resource));
        }

        let response = self
            .http
            .post(&self.metadata.token_endpoint)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            // Don't log the body, it may contain sensitive information
            let status = response.status();
            warn!(status = %status, "Token endpoint returned error");
            return Err(AuthError::AuthenticationFailed(format!(
                "token endpoint returned {}",
                status
            )));
        }

        Ok(response.json().await?)
    }
}

fn lookup_key(jwks: &JwkSet, kid: Option<&str>) -> AuthResult<Option<DecodingKey>> {
    let jwk = match kid {
        Some(kid) => jwks.find(kid),
        None if jwks.keys.len() == 1 => jwks.keys.first(),
        None => None,
    };
    jwk.map(DecodingKey::from_jwk).transpose().map_err(AuthError::from)
}

fn required<'a>(value: &'a Option<String>, name: &str) -> AuthResult<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AuthError::AuthenticationFailed(format!("{} missing from response", name)))
}

#[async_trait]
impl IdentityProvider for OidcClient {
    fn authorization_url(&self, context: &AuthenticationRequestContext) -> AuthResult<String> {
        let mut url = url::Url::parse(&self.metadata.authorization_endpoint)
            .map_err(|e| AuthError::Oidc(format!("Invalid authorization endpoint: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("client_id", &self.config.client_id);
            query.append_pair("response_type", self.config.response_type.as_str());
            query.append_pair("response_mode", self.config.response_mode.as_str());
            query.append_pair("redirect_uri", &self.config.redirect_url);
            query.append_pair("scope", &self.config.scopes().join(" "));
            query.append_pair("state", &context.state);
            query.append_pair("nonce", &context.nonce);
            if let Some(resource) = &context.resource_url {
                query.append_pair("resource", resource);
            }
        }

        Ok(url.to_string())
    }

    async fn verify_return(
        &self,
        params: &ReturnParams,
        context: &AuthenticationRequestContext,
    ) -> AuthResult<VerifiedIdentity> {
        if let Some(error) = &params.error {
            let description = params
                .error_description
                .as_deref()
                .unwrap_or("Authentication failed");
            return Err(AuthError::AuthenticationFailed(format!("{}: {}", error, description)));
        }

        if params.state.as_deref() != Some(context.state.as_str()) {
            return Err(AuthError::InvalidState("state does not match request".to_string()));
        }

        let (claims, tokens) = match self.config.response_type {
            ResponseType::IdToken => {
                let id_token = required(&params.id_token, "id_token")?;
                let (claims, _) = self.validate(id_token, &context.nonce).await?;
                (claims, None)
            }
            ResponseType::CodeIdToken | ResponseType::IdTokenCode => {
                let id_token = required(&params.id_token, "id_token")?;
                let code = required(&params.code, "code")?;
                let (claims, alg) = self.validate(id_token, &context.nonce).await?;
                verify_required_hash_claim(&claims, "c_hash", code, alg)?;
                let tokens = self.redeem_code(code, context).await?;
                (claims, Some(tokens))
            }
            ResponseType::Code => {
                let code = required(&params.code, "code")?;
                let tokens = self.redeem_code(code, context).await?;
                let id_token = required(&tokens.id_token, "id_token")?;
                let (claims, alg) = self.validate(id_token, &context.nonce).await?;
                verify_hash_claim(&claims, "at_hash", &tokens.access_token, alg)?;
                (claims, Some(tokens))
            }
        };

        let string_claim = |name: &str| {
            claims
                .get(name)
                .and_then(Value::as_str)
                .map(String::from)
                .ok_or_else(|| AuthError::AuthenticationFailed(format!("{} claim missing", name)))
        };
        let issuer = string_claim("iss")?;
        let subject = string_claim("sub")?;

        debug!(issuer = %issuer, subject = %subject, "Provider response validated");

        Ok(VerifiedIdentity {
            issuer,
            subject,
            profile: claims.clone(),
            access_token: tokens.as_ref().map(|t| t.access_token.clone()),
            refresh_token: tokens.and_then(|t| t.refresh_token),
            raw_claims: Some(claims),
            request_state: if self.config.pass_req_to_callback {
                context.custom_state.clone()
            } else {
                None
            },
        })
    }

    fn end_session_endpoint(&self) -> Option<&str> {
        self.metadata.end_session_endpoint.as_deref()
    }
}
