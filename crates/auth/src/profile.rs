//! User profile built from provider claims

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{AuthError, AuthResult};

/// Claim holding the stable object identifier used as the local user key.
pub const OID_CLAIM: &str = "oid";

/// A user known to this application.
///
/// `oid` is mandatory; every other provider claim is optional and kept in
/// `claims` as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Object identifier (unique, stable)
    pub oid: String,

    /// Display name (if available)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Email address or user principal name (if available)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Remaining claims from the provider profile
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub claims: Map<String, Value>,
}

impl UserProfile {
    /// Creates a profile with only the identity field set
    pub fn new(oid: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            display_name: None,
            email: None,
            claims: Map::new(),
        }
    }

    /// Sets the email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the display name
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Adds an extra claim
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.claims.insert(name.into(), value.into());
        self
    }

    /// Builds a profile from a provider claim set.
    ///
    /// Fails with [`AuthError::IdentityClaimMissing`] when `oid` is absent,
    /// not a string, or empty. `name` becomes the display name; the email is
    /// taken from `email`, then `preferred_username`, then `upn`.
    pub fn from_claims(claims: &Map<String, Value>) -> AuthResult<Self> {
        let oid = claims
            .get(OID_CLAIM)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|oid| !oid.is_empty())
            .ok_or(AuthError::IdentityClaimMissing)?;

        let string_claim = |name: &str| claims.get(name).and_then(Value::as_str).map(String::from);

        let display_name = string_claim("name");
        let email = string_claim("email")
            .or_else(|| string_claim("preferred_username"))
            .or_else(|| string_claim("upn"));

        let extra = claims
            .iter()
            .filter(|(key, _)| !matches!(key.as_str(), OID_CLAIM | "name" | "email"))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Self {
            oid: oid.to_string(),
            display_name,
            email,
            claims: extra,
        })
    }

    /// Returns the display name, falling back to email or oid
    pub fn display(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.oid)
    }
}
