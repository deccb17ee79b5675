use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    db::UserRepository,
    error::{AppError, AppResult},
    models::User,
};

/// Lifetime of a fresh session
const SESSION_TTL_DAYS: i64 = 30;
/// Sessions closer than this to expiry are extended on use
const SESSION_RENEW_WITHIN_DAYS: i64 = 15;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// A newly issued session; the token is only ever held by the client
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Registration, login and session validation
#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
}

impl AuthService {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }

    pub async fn register(&self, username: &str, password: &str) -> AppResult<IssuedSession> {
        validate_username(username)?;
        validate_password(password)?;

        if self.users.find_by_username(username).await?.is_some() {
            return Err(AppError::InvalidInput("Username already taken".to_string()));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
        };
        let password_hash = hash_password(password)?;
        self.users
            .create_user(&user.id, &user.username, &password_hash)
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        self.issue_session(user).await
    }

    pub async fn login(&self, username: &str, password: &str) -> AppResult<IssuedSession> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::InvalidInput(INVALID_CREDENTIALS.to_string()));
        }

        let credentials = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::InvalidInput(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&credentials.password_hash, password)? {
            tracing::debug!(username = %username, "Rejected login with wrong password");
            return Err(AppError::InvalidInput(INVALID_CREDENTIALS.to_string()));
        }

        self.issue_session(credentials.into()).await
    }

    /// Resolves a session token to its user, renewing or expiring the session
    pub async fn validate(&self, token: &str) -> AppResult<Option<User>> {
        let session_id = session_id_for(token);
        let Some(session) = self.users.find_session(&session_id).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        if now >= session.expires_at {
            self.users.delete_session(&session.id).await?;
            tracing::debug!(user_id = %session.user_id, "Session expired");
            return Ok(None);
        }

        if now >= session.expires_at - Duration::days(SESSION_RENEW_WITHIN_DAYS) {
            let expires_at = now + Duration::days(SESSION_TTL_DAYS);
            self.users.extend_session(&session.id, expires_at).await?;
        }

        Ok(Some(session.user()))
    }

    pub async fn logout(&self, token: &str) -> AppResult<()> {
        self.users.delete_session(&session_id_for(token)).await
    }

    async fn issue_session(&self, user: User) -> AppResult<IssuedSession> {
        let token = generate_session_token();
        let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);
        self.users
            .create_session(&session_id_for(&token), &user.id, expires_at)
            .await?;

        Ok(IssuedSession {
            user,
            token,
            expires_at,
        })
    }
}

/// 256 random bits, hex encoded
fn generate_session_token() -> String {
    format!(
        "{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    )
}

/// Sessions are stored under the SHA-256 of the token, never the token itself
fn session_id_for(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

fn validate_username(username: &str) -> AppResult<()> {
    let valid = (3..=31).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(AppError::InvalidInput(
            "Username must be 3-31 characters of a-z, 0-9, _ or -".to_string(),
        ))
    }
}

fn validate_password(password: &str) -> AppResult<()> {
    if (6..=255).contains(&password.len()) {
        Ok(())
    } else {
        Err(AppError::InvalidInput(
            "Password must be 6-255 characters".to_string(),
        ))
    }
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(password_hash.to_string())
}

fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Failed to parse password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
