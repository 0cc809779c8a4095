//! Application state

use std::sync::Arc;

use auth::{
    AuthenticationStrategy, CookieCipher, IdentityProvider, MemoryUserDirectory, OidcClient,
    SessionSerializer, UserRepository,
};

use crate::config::ServerConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Identity provider client
    pub provider: Arc<dyn IdentityProvider>,

    /// Maps verified identities to directory users
    pub strategy: AuthenticationStrategy,

    /// Maps session identifiers back to users
    pub serializer: SessionSerializer,

    /// Context cookie cipher (only in cookie mode)
    pub cookie_cipher: Option<Arc<CookieCipher>>,
}

impl AppState {
    /// Create application state around an identity provider and directory
    pub fn new(
        config: ServerConfig,
        provider: Arc<dyn IdentityProvider>,
        users: Arc<dyn UserRepository>,
    ) -> Result<Self, StateError> {
        let cookie_cipher = if config.oidc.use_cookie_instead_of_session {
            Some(Arc::new(CookieCipher::new(&config.oidc.cookie_encryption_keys)?))
        } else {
            None
        };

        Ok(Self {
            config: Arc::new(config),
            provider,
            strategy: AuthenticationStrategy::new(users.clone()),
            serializer: SessionSerializer::new(users),
            cookie_cipher,
        })
    }

    /// Discover the configured provider and start with an empty directory
    pub async fn discover(config: ServerConfig) -> Result<Self, StateError> {
        let client = OidcClient::discover(config.oidc.clone()).await?;
        let users: Arc<dyn UserRepository> = Arc::new(MemoryUserDirectory::new());

        Self::new(config, Arc::new(client), users)
    }
}

/// State initialization errors
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to initialize auth: {0}")]
    Auth(#[from] auth::AuthError),
}
