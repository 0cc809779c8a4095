//! Authentication request context
//!
//! Each login attempt creates an [`AuthenticationRequestContext`] that must be
//! presented back, by `state`, when the provider returns the browser. Pending
//! contexts of a browser session are kept in a bounded [`PendingRequests`]
//! list; taking a context removes it, so each one is usable exactly once.

use serde::{Deserialize, Serialize};

/// Options for starting an authentication request
#[derive(Debug, Clone, Default)]
pub struct AuthorizeOptions {
    /// Resource the access token is requested for
    pub resource_url: Option<String>,

    /// Application state echoed back to the verification step
    pub custom_state: Option<String>,

    /// Where to send the browser if authentication fails
    pub failure_redirect: String,
}

/// Per-attempt state correlating the authorization request with its return
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationRequestContext {
    /// CSRF token sent as the `state` parameter
    pub state: String,

    /// Nonce for ID token validation
    pub nonce: String,

    /// Requested resource
    #[serde(default)]
    pub resource_url: Option<String>,

    /// Application-supplied state
    #[serde(default)]
    pub custom_state: Option<String>,

    /// Failure redirect for this attempt
    pub failure_redirect: String,

    /// Timestamp when this context was created
    pub created_at: i64,
}

impl AuthenticationRequestContext {
    /// Create a fresh context with random state and nonce
    pub fn new(options: AuthorizeOptions) -> Self {
        Self {
            state: generate_random_string(32),
            nonce: generate_random_string(32),
            resource_url: options.resource_url,
            custom_state: options.custom_state,
            failure_redirect: options.failure_redirect,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Check if this context is older than `max_age_secs`
    pub fn is_expired(&self, max_age_secs: i64) -> bool {
        let now = chrono::Utc::now().timestamp();
        now - self.created_at > max_age_secs
    }
}

/// Pending contexts of one browser session, oldest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingRequests {
    contexts: Vec<AuthenticationRequestContext>,
}

impl PendingRequests {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a context, dropping expired entries and then the oldest ones so
    /// that at most `max_amount` remain.
    pub fn push(&mut self, context: AuthenticationRequestContext, max_age_secs: i64, max_amount: usize) {
        self.cleanup_expired(max_age_secs);
        self.contexts.push(context);

        let max_amount = max_amount.max(1);
        if self.contexts.len() > max_amount {
            let excess = self.contexts.len() - max_amount;
            self.contexts.drain(..excess);
        }
    }

    /// Remove and return the context for `state`, if present and not expired
    pub fn take(&mut self, state: &str, max_age_secs: i64) -> Option<AuthenticationRequestContext> {
        self.cleanup_expired(max_age_secs);
        let index = self.contexts.iter().position(|c| c.state == state)?;
        Some(self.contexts.remove(index))
    }

    /// Remove expired contexts, returning how many were dropped
    pub fn cleanup_expired(&mut self, max_age_secs: i64) -> usize {
        let before_count = self.contexts.len();
        self.contexts.retain(|context| !context.is_expired(max_age_secs));
        before_count - self.contexts.len()
    }

    /// Number of pending contexts
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Returns true if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

/// Generate a random string for state/nonce
pub(crate) fn generate_random_string(len: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..len)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> AuthorizeOptions {
        AuthorizeOptions {
            resource_url: Some("https://graph.example.com".to_string()),
            custom_state: Some("my_state".to_string()),
            failure_redirect: "/".to_string(),
        }
    }

    #[test]
    fn test_context_new() {
        let context = AuthenticationRequestContext::new(options());

        assert_eq!(context.state.len(), 32);
        assert_eq!(context.nonce.len(), 32);
        assert_ne!(context.state, context.nonce);
        assert_eq!(context.custom_state.as_deref(), Some("my_state"));
        assert!(!context.is_expired(600));
    }

    #[test]
    fn test_context_expired() {
        let mut context = AuthenticationRequestContext::new(options());
        context.created_at = chrono::Utc::now().timestamp() - 1000;

        assert!(context.is_expired(600));
    }

    #[test]
    fn test_take_is_single_use() {
        let mut pending = PendingRequests::new();
        let context = AuthenticationRequestContext::new(options());
        let state = context.state.clone();
        pending.push(context.clone(), 3600, 10);

        assert_eq!(pending.take(&state, 3600), Some(context));
        // Take again (should be None - already removed)
        assert!(pending.take(&state, 3600).is_none());
        assert!(pending.is_empty());
    }

    #[test]
    fn test_take_rejects_expired() {
        let mut pending = PendingRequests::new();
        let mut context = AuthenticationRequestContext::new(options());
        context.created_at = chrono::Utc::now().timestamp() - 1000;
        let state = context.state.clone();
        pending.contexts.push(context);

        assert!(pending.take(&state, 600).is_none());
        assert!(pending.is_empty());
    }

    #[test]
    fn test_push_evicts_oldest() {
        let mut pending = PendingRequests::new();
        let contexts: Vec<_> = (0..4)
            .map(|_| AuthenticationRequestContext::new(options()))
            .collect();
        for context in &contexts {
            pending.push(context.clone(), 3600, 3);
        }

        assert_eq!(pending.len(), 3);
        assert!(pending.take(&contexts[0].state, 3600).is_none());
        assert!(pending.take(&contexts[3].state, 3600).is_some());
    }

    #[test]
    fn test_cleanup_expired() {
        let mut pending = PendingRequests::new();

        let mut old_context = AuthenticationRequestContext::new(options());
        old_context.created_at = chrono::Utc::now().timestamp() - 1000;
        let fresh_context = AuthenticationRequestContext::new(options());

        pending.contexts.push(old_context);
        pending.contexts.push(fresh_context.clone());

        assert_eq!(pending.cleanup_expired(600), 1);
        assert_eq!(pending.take(&fresh_context.state, 600), Some(fresh_context));
    }
}
