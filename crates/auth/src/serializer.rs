//! Session identity serialization

use std::sync::Arc;

use crate::{AuthResult, UserProfile, UserRepository};

/// Converts users to the identifier kept in the session and back.
#[derive(Clone)]
pub struct SessionSerializer {
    users: Arc<dyn UserRepository>,
}

impl SessionSerializer {
    /// Create a serializer resolving identifiers through the given directory
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// The session representation of a user is its `oid`
    pub fn serialize(&self, user: &UserProfile) -> String {
        user.oid.clone()
    }

    /// Rehydrate a user from a session identifier.
    ///
    /// `None` means the session no longer maps to a known user and must be
    /// treated as anonymous.
    pub async fn deserialize(&self, oid: &str) -> AuthResult<Option<UserProfile>> {
        self.users.find(oid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryUserDirectory;

    #[tokio::test]
    async fn test_roundtrip_for_registered_user() {
        let directory = Arc::new(MemoryUserDirectory::new());
        let user = UserProfile::new("abc").with_display_name("Alice");
        directory.insert(user.clone()).await.unwrap();

        let serializer = SessionSerializer::new(directory);
        let id = serializer.serialize(&user);
        assert_eq!(id, "abc");

        let restored = serializer.deserialize(&id).await.unwrap();
        assert_eq!(restored, Some(user));
    }

    #[tokio::test]
    async fn test_unknown_identifier_is_absent() {
        let serializer = SessionSerializer::new(Arc::new(MemoryUserDirectory::new()));
        assert!(serializer.deserialize("ghost").await.unwrap().is_none());
    }
}
