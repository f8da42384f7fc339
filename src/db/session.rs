//! Server-side login sessions.
//!
//! A session row maps the random key stored in the `sessionid` cookie to a
//! user. Expired rows are ignored by lookups and purged by `cleanup_expired`.

use chrono::{Duration, Utc};
use rand::Rng;

use super::DbPool;
use crate::datetime::DB_FORMAT;
use crate::{BoardsError, Result};

/// Session entity.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub id: i64,
    /// Random key sent to the browser.
    pub session_key: String,
    pub user_id: i64,
    pub created_at: String,
    pub expires_at: String,
}

/// Characters used in session keys.
const KEY_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of a session key.
pub const SESSION_KEY_LENGTH: usize = 32;

/// Generate a random session key.
pub fn generate_session_key() -> String {
    let mut rng = rand::rng();
    (0..SESSION_KEY_LENGTH)
        .map(|_| KEY_CHARS[rng.random_range(0..KEY_CHARS.len())] as char)
        .collect()
}

/// New session for creation.
pub struct NewSession {
    pub session_key: String,
    pub user_id: i64,
    /// Lifetime in seconds from now.
    pub ttl_secs: i64,
}

impl NewSession {
    /// Create a session with a fresh random key.
    pub fn generate(user_id: i64, ttl_secs: i64) -> Self {
        Self {
            session_key: generate_session_key(),
            user_id,
            ttl_secs,
        }
    }
}

/// Repository for session operations.
pub struct SessionRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> SessionRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Store a new session.
    pub async fn create(&self, new_session: &NewSession) -> Result<Session> {
        let expires_at = (Utc::now() + Duration::seconds(new_session.ttl_secs))
            .format(DB_FORMAT)
            .to_string();

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO sessions (session_key, user_id, expires_at) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(&new_session.session_key)
        .bind(new_session.user_id)
        .bind(&expires_at)
        .fetch_one(self.pool)
        .await
        .map_err(|e| BoardsError::Database(e.to_string()))?;

        sqlx::query_as::<_, Session>(
            "SELECT id, session_key, user_id, created_at, expires_at FROM sessions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| BoardsError::Database(e.to_string()))?
        .ok_or_else(|| BoardsError::NotFound("session".to_string()))
    }

    /// Get a session by key if it has not expired.
    pub async fn get_valid(&self, session_key: &str) -> Result<Option<Session>> {
        let result = sqlx::query_as::<_, Session>(
            "SELECT id, session_key, user_id, created_at, expires_at
             FROM sessions
             WHERE session_key = ? AND expires_at > datetime('now')",
        )
        .bind(session_key)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| BoardsError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Delete a session by key.
    pub async fn delete(&self, session_key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE session_key = ?")
            .bind(session_key)
            .execute(self.pool)
            .await
            .map_err(|e| BoardsError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every session belonging to a user.
    pub async fn delete_all_for_user(&self, user_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(self.pool)
            .await
            .map_err(|e| BoardsError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    /// Delete expired sessions.
    pub async fn cleanup_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= datetime('now')")
            .execute(self.pool)
            .await
            .map_err(|e| BoardsError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};
    use crate::Database;

    async fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("john", "john@doe.com", "pw"))
            .await
            .unwrap();
        (db, user.id)
    }

    #[tokio::test]
    async fn test_create_and_get_valid() {
        let (db, user_id) = setup().await;
        let repo = SessionRepository::new(db.pool());

        let session = repo
            .create(&NewSession::generate(user_id, 3600))
            .await
            .unwrap();
        assert_eq!(session.user_id, user_id);
        assert_eq!(session.session_key.len(), 32);

        let found = repo.get_valid(&session.session_key).await.unwrap();
        assert_eq!(found.unwrap().id, session.id);
        assert!(repo.get_valid("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_not_valid() {
        let (db, user_id) = setup().await;
        let repo = SessionRepository::new(db.pool());

        let session = repo.create(&NewSession::generate(user_id, -60)).await.unwrap();
        assert!(repo.get_valid(&session.session_key).await.unwrap().is_none());

        assert_eq!(repo.cleanup_expired().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let (db, user_id) = setup().await;
        let repo = SessionRepository::new(db.pool());

        let session = repo
            .create(&NewSession::generate(user_id, 3600))
            .await
            .unwrap();
        assert!(repo.delete(&session.session_key).await.unwrap());
        assert!(!repo.delete(&session.session_key).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_all_for_user() {
        let (db, user_id) = setup().await;
        let repo = SessionRepository::new(db.pool());

        repo.create(&NewSession::generate(user_id, 3600)).await.unwrap();
        repo.create(&NewSession::generate(user_id, 3600)).await.unwrap();

        assert_eq!(repo.delete_all_for_user(user_id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_user_delete_cascades() {
        let (db, user_id) = setup().await;
        let repo = SessionRepository::new(db.pool());
        let session = repo
            .create(&NewSession::generate(user_id, 3600))
            .await
            .unwrap();

        UserRepository::new(db.pool()).delete(user_id).await.unwrap();
        assert!(repo.get_valid(&session.session_key).await.unwrap().is_none());
    }
}
