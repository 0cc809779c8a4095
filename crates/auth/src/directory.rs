//! User directory storage
//!
//! This module provides storage backends for user profiles registered on
//! first sign-in. The in-memory backend lives for the lifetime of the
//! process; the SQLite backend (feature `sqlx`) survives restarts.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{AuthResult, UserProfile};

/// Trait for user directory storage
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look up a user by object identifier
    ///
    /// A missing user is `Ok(None)`, not an error.
    async fn find(&self, oid: &str) -> AuthResult<Option<UserProfile>>;

    /// Store a profile unless one with the same `oid` already exists
    ///
    /// Returns the stored entry, which is the existing one when the `oid`
    /// was already registered.
    async fn insert(&self, profile: UserProfile) -> AuthResult<UserProfile>;
}

/// In-memory user directory
///
/// Entries are kept in registration order. Reads hand out copies, so a
/// returned profile cannot change the directory.
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: RwLock<Vec<UserProfile>>,
}

impl MemoryUserDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered users
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Returns true if nobody has registered yet
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    /// Snapshot of all users in registration order
    pub async fn list(&self) -> Vec<UserProfile> {
        self.users.read().await.clone()
    }
}

#[async_trait]
impl UserRepository for MemoryUserDirectory {
    async fn find(&self, oid: &str) -> AuthResult<Option<UserProfile>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|user| user.oid == oid).cloned())
    }

    async fn insert(&self, profile: UserProfile) -> AuthResult<UserProfile> {
        let mut users = self.users.write().await;
        if let Some(existing) = users.iter().find(|user| user.oid == profile.oid) {
            return Ok(existing.clone());
        }
        users.push(profile.clone());
        Ok(profile)
    }
}

#[cfg(feature = "sqlx")]
pub use sqlx_store::*;

#[cfg(feature = "sqlx")]
mod sqlx_store {
    use super::*;
    use serde_json::{Map, Value};
    use sqlx::{Pool, Sqlite};

    type UserRow = (String, Option<String>, Option<String>, String);

    fn row_to_profile((oid, display_name, email, claims): UserRow) -> AuthResult<UserProfile> {
        let claims: Map<String, Value> = serde_json::from_str(&claims)?;
        Ok(UserProfile {
            oid,
            display_name,
            email,
            claims,
        })
    }

    /// SQLite user directory (persists registrations across restarts)
    #[derive(Clone)]
    pub struct SqliteUserDirectory {
        pool: Pool<Sqlite>,
    }

    impl SqliteUserDirectory {
        /// Create a new SQLite directory
        pub fn new(pool: Pool<Sqlite>) -> Self {
            Self { pool }
        }

        /// Initialize the database table
        pub async fn init(&self) -> AuthResult<()> {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS users (
                    oid TEXT PRIMARY KEY,
                    display_name TEXT,
                    email TEXT,
                    claims TEXT NOT NULL,
                    created_at INTEGER NOT NULL
                )
                "#,
            )
            .execute(&self.pool)
            .await?;

            Ok(())
        }
    }

    #[async_trait]
    impl UserRepository for SqliteUserDirectory {
        async fn find(&self, oid: &str) -> AuthResult<Option<UserProfile>> {
            let row: Option<UserRow> = sqlx::query_as(
                r#"
                SELECT oid, display_name, email, claims
                FROM users
                WHERE oid = ?
                "#,
            )
            .bind(oid)
            .fetch_optional(&self.pool)
            .await?;

            row.map(row_to_profile).transpose()
        }

        async fn insert(&self, profile: UserProfile) -> AuthResult<UserProfile> {
            let claims = serde_json::to_string(&profile.claims)?;
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO users (oid, display_name, email, claims, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&profile.oid)
            .bind(&profile.display_name)
            .bind(&profile.email)
            .bind(claims)
            .bind(chrono::Utc::now().timestamp())
            .execute(&self.pool)
            .await?;

            self.find(&profile.oid)
                .await?
                .ok_or_else(|| crate::AuthError::Storage(format!("user {} vanished after insert", profile.oid)))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_sqlite_directory_roundtrip() {
            let pool = sqlx::sqlite::SqlitePoolOptions::new()
                .max_connections(1)
                .connect("sqlite::memory:")
                .await
                .unwrap();
            let directory = SqliteUserDirectory::new(pool);
            directory.init().await.unwrap();

            let alice = UserProfile::new("abc")
                .with_display_name("Alice")
                .with_claim("tid", "tenant-1");
            directory.insert(alice.clone()).await.unwrap();

            let stored = directory.insert(UserProfile::new("abc")).await.unwrap();
            assert_eq!(stored, alice);
            assert_eq!(directory.find("abc").await.unwrap(), Some(alice));
            assert!(directory.find("missing").await.unwrap().is_none());
        }
    }
}
