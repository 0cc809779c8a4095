//! Authentication error types.

use thiserror::Error;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider profile carries no usable `oid` claim.
    #[error("Identity claim `oid` missing from profile")]
    IdentityClaimMissing,

    /// The provider response was rejected (token, state or nonce).
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The local session could not be destroyed.
    #[error("Session destroy failed: {0}")]
    SessionDestroyFailed(String),

    /// Invalid or unknown request state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// JWT validation failed.
    #[error("JWT validation failed: {0}")]
    JwtValidation(String),

    /// Token expired.
    #[error("Token expired")]
    TokenExpired,

    /// Invalid token.
    #[error("Invalid token")]
    InvalidToken,

    /// OIDC protocol error.
    #[error("OIDC error: {0}")]
    Oidc(String),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Cookie encryption or decryption failed.
    #[error("Cookie encryption error")]
    Crypto,

    /// User directory backend error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AuthError {
    /// Returns true for errors caused by the identity provider's response or
    /// the browser's request, as opposed to faults inside this process.
    ///
    /// Authentication failures are answered with a redirect to the failure
    /// page; everything else is an internal error for the current request.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            AuthError::IdentityClaimMissing
                | AuthError::AuthenticationFailed(_)
                | AuthError::InvalidState(_)
                | AuthError::JwtValidation(_)
                | AuthError::TokenExpired
                | AuthError::InvalidToken
                | AuthError::Oidc(_)
                | AuthError::Http(_)
                | AuthError::Crypto
        )
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            jsonwebtoken::errors::ErrorKind::InvalidToken => AuthError::InvalidToken,
            _ => AuthError::JwtValidation(e.to_string()),
        }
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::Storage(e.to_string())
    }
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;
