use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    models::User,
};

/// User row including the stored password hash
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: String,
    pub username: String,
    pub password_hash: String,
}

impl From<UserCredentials> for User {
    fn from(credentials: UserCredentials) -> Self {
        User {
            id: credentials.id,
            username: credentials.username,
        }
    }
}

/// Session joined with its owner
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn user(&self) -> User {
        User {
            id: self.user_id.clone(),
            username: self.username.clone(),
        }
    }
}

/// Accounts and sessions
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_user(&self, id: &str, username: &str, password_hash: &str) -> AppResult<()> {
        let result = sqlx::query("INSERT INTO user (id, username, password_hash) VALUES (?, ?, ?)")
            .bind(id)
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::InvalidInput("Username already taken".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<UserCredentials>> {
        let credentials = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, username, password_hash FROM user WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credentials)
    }

    pub async fn create_session(
        &self,
        session_id: &str,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query("INSERT INTO session (id, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn find_session(&self, session_id: &str) -> AppResult<Option<SessionRecord>> {
        let session = sqlx::query_as::<_, SessionRecord>(
            r#"
            SELECT session.id, session.user_id, user.username, session.expires_at
            FROM session
            INNER JOIN user ON user.id = session.user_id
            WHERE session.id = ?
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    pub async fn extend_session(&self, session_id: &str, expires_at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE session SET expires_at = ? WHERE id = ?")
            .bind(expires_at)
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn delete_session(&self, session_id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM session WHERE id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_in_memory_pool;
    use chrono::Duration;

    async fn repository() -> UserRepository {
        UserRepository::new(create_in_memory_pool().await.unwrap())
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let repo = repository().await;
        repo.create_user("u1", "alice", "hash").await.unwrap();

        let found = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, "u1");
        assert_eq!(found.password_hash, "hash");
        assert!(repo.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let repo = repository().await;
        repo.create_user("u1", "alice", "hash").await.unwrap();

        let result = repo.create_user("u2", "alice", "other").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let repo = repository().await;
        repo.create_user("u1", "alice", "hash").await.unwrap();

        let expires = Utc::now() + Duration::days(30);
        repo.create_session("s1", "u1", expires).await.unwrap();

        let session = repo.find_session("s1").await.unwrap().unwrap();
        assert_eq!(session.user().username, "alice");
        assert_eq!(session.expires_at, expires);

        let later = expires + Duration::days(10);
        repo.extend_session("s1", later).await.unwrap();
        let session = repo.find_session("s1").await.unwrap().unwrap();
        assert_eq!(session.expires_at, later);

        repo.delete_session("s1").await.unwrap();
        assert!(repo.find_session("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_requires_existing_user() {
        let repo = repository().await;
        let result = repo.create_session("s1", "ghost", Utc::now()).await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
