//! Domain service for authentication and user management.
//!
//! Covers user credentials, login sessions and API keys.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::db::{ApiKey, SessionInfo};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User already exists: {0}")]
    Conflict(String),

    #[error("API key not found: {0}")]
    KeyNotFound(i32),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Issued on successful login; the HTTP layer turns it into a cookie.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user_id: i32,
    pub username: String,
    pub token: String,
    pub csrf_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a user with a freshly salted password hash.
    ///
    /// # Errors
    ///
    /// - Returns [`AuthError::Conflict`] if the username is taken
    /// - Returns [`AuthError::Validation`] on empty username or password
    async fn add_user(&self, username: &str, password: &str) -> Result<i32, AuthError>;

    /// Rotates the salt and hash of an existing user.
    async fn change_password(&self, username: &str, password: &str) -> Result<(), AuthError>;

    /// Returns the user id when the password matches. Unknown users and bad
    /// passwords are indistinguishable.
    async fn authenticate(&self, username: &str, password: &str)
    -> Result<Option<i32>, AuthError>;

    async fn remove_user(&self, username: &str) -> Result<(), AuthError>;

    async fn list_users(&self) -> Result<Vec<String>, AuthError>;

    async fn user_exists(&self, username: &str) -> Result<bool, AuthError>;

    /// Verifies credentials and opens a new session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Resolves a session cookie. Expired sessions are deleted and yield `None`.
    async fn session(&self, token: &str) -> Result<Option<SessionInfo>, AuthError>;

    async fn logout(&self, token: &str) -> Result<(), AuthError>;

    /// Deletes sessions older than the configured lifetime.
    async fn clean_up_sessions(&self) -> Result<u64, AuthError>;

    async fn create_api_key(&self, name: &str) -> Result<String, AuthError>;

    /// Returns the key's name if the key is valid.
    async fn verify_api_key(&self, key: &str) -> Result<Option<String>, AuthError>;

    async fn list_api_keys(&self) -> Result<Vec<ApiKey>, AuthError>;

    async fn delete_api_key(&self, id: i32) -> Result<(), AuthError>;
}
