//! Credential store: user creation and lookup
//!
//! No update or delete surface; users are created on registration and read on
//! login and authorization.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use sealnote_core::types::{User, UserRecord};

use crate::error::{StoreError, StoreResult};
use crate::Store;

impl Store {
    /// Insert a new user. A username or email collision surfaces as
    /// [`StoreError::DuplicateIdentity`] via the UNIQUE indexes.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> StoreResult<User> {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            created_at: now_utc(),
        };

        let conn = self.conn.lock().await;
        let inserted = conn.execute(
            "INSERT INTO users (id, username, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id.to_string(),
                user.username,
                user.email,
                password_hash,
                format_ts(&user.created_at),
            ],
        );

        match inserted {
            Ok(_) => {
                tracing::debug!(user_id = %user.id, "user created");
                Ok(user)
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateIdentity)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a user by email, hash included (login path only).
    pub async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT id, username, email, password_hash, created_at
             FROM users WHERE email = ?1",
            params![email],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )
        .optional()?
        .map(|(id, username, email, password_hash, created_at)| {
            Ok(UserRecord {
                user: User {
                    id: parse_uuid(&id)?,
                    username,
                    email,
                    created_at: parse_ts(&created_at)?,
                },
                password_hash,
            })
        })
        .transpose()
    }
}

/// Now, truncated to the stored (microsecond) precision so values written and
/// re-read compare equal.
pub(crate) fn now_utc() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}

pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(s: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("invalid timestamp: {e}")))
}

pub(crate) fn parse_uuid(s: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| StoreError::Corrupt(format!("invalid UUID: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealnote_crypto::{BodyCipher, KEY_SIZE};

    fn test_store() -> Store {
        Store::open_in_memory(BodyCipher::new([7u8; KEY_SIZE])).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let store = test_store();

        let created = store
            .create_user("alice", "a@x.com", "$argon2id$fake")
            .await
            .unwrap();
        let found = store.find_user_by_email("a@x.com").await.unwrap().unwrap();

        assert_eq!(found.user.id, created.id);
        assert_eq!(found.user.username, "alice");
        assert_eq!(found.password_hash, "$argon2id$fake");
        assert_eq!(found.user.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_unknown_email_is_none() {
        let store = test_store();
        assert!(store.find_user_by_email("nobody@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = test_store();
        store.create_user("alice", "a@x.com", "h").await.unwrap();

        let err = store.create_user("bob", "a@x.com", "h").await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateIdentity));
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let store = test_store();
        store.create_user("alice", "a@x.com", "h").await.unwrap();

        let err = store.create_user("alice", "b@x.com", "h").await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateIdentity));
    }

    #[tokio::test]
    async fn test_distinct_identity_accepted() {
        let store = test_store();
        store.create_user("alice", "a@x.com", "h").await.unwrap();
        store.create_user("bob", "b@x.com", "h").await.unwrap();
    }
}
