//! Verification step run after the provider response has been validated.
//!
//! [`AuthenticationStrategy::verify`] receives the identity the OIDC client
//! extracted from a validated response and maps it onto a local user,
//! registering the user on first sign-in.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::{AuthResult, UserProfile, UserRepository};

/// Identity extracted from a provider response whose signature, issuer,
/// audience, nonce and lifetime have already been checked.
#[derive(Debug, Clone, Default)]
pub struct VerifiedIdentity {
    /// Token issuer (`iss`)
    pub issuer: String,

    /// Subject identifier (`sub`)
    pub subject: String,

    /// Profile claims; must include `oid`
    pub profile: Map<String, Value>,

    /// Access token, when the flow redeemed a code
    pub access_token: Option<String>,

    /// Refresh token, when granted
    pub refresh_token: Option<String>,

    /// Full ID token claim set
    pub raw_claims: Option<Map<String, Value>>,

    /// Custom state of the originating request (only with `pass_req_to_callback`)
    pub request_state: Option<String>,
}

/// Outcome of a successful verification
#[derive(Debug, Clone, PartialEq)]
pub enum Authentication {
    /// The user was already in the directory
    Returning(UserProfile),
    /// The user was registered by this sign-in
    Registered(UserProfile),
}

impl Authentication {
    /// The resolved user
    pub fn user(&self) -> &UserProfile {
        match self {
            Self::Returning(user) | Self::Registered(user) => user,
        }
    }

    /// Consumes the outcome, returning the user
    pub fn into_user(self) -> UserProfile {
        match self {
            Self::Returning(user) | Self::Registered(user) => user,
        }
    }

    /// Returns true if this sign-in created the user
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Registered(_))
    }
}

/// Resolves verified identities to directory users, auto-registering
/// unknown ones.
#[derive(Clone)]
pub struct AuthenticationStrategy {
    users: Arc<dyn UserRepository>,
}

impl AuthenticationStrategy {
    /// Create a strategy backed by the given directory
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Verify an identity and resolve it to a local user.
    ///
    /// Fails with [`crate::AuthError::IdentityClaimMissing`] when the profile
    /// has no `oid`; the directory is not touched in that case.
    pub async fn verify(&self, identity: &VerifiedIdentity) -> AuthResult<Authentication> {
        let profile = UserProfile::from_claims(&identity.profile)?;

        if let Some(user) = self.users.find(&profile.oid).await? {
            debug!(oid = %user.oid, issuer = %identity.issuer, "Returning user");
            return Ok(Authentication::Returning(user));
        }

        let user = self.users.insert(profile).await?;
        info!(
            oid = %user.oid,
            subject = %identity.subject,
            issuer = %identity.issuer,
            "Registered new user"
        );
        Ok(Authentication::Registered(user))
    }
}
