//! `SeaORM` implementation of the `AuthService` trait.

use crate::constants::limits::MAX_NAME_LENGTH;
use crate::db::{ApiKey, SessionInfo, SessionLookup, Store};
use crate::services::auth_service::{AuthError, AuthService, LoginResult};
use async_trait::async_trait;
use tracing::{info, warn};

pub struct SeaOrmAuthService {
    store: Store,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

fn validate_credentials(username: &str, password: &str) -> Result<(), AuthError> {
    if username.trim().is_empty() {
        return Err(AuthError::Validation("Username cannot be empty".to_string()));
    }
    if username.len() > MAX_NAME_LENGTH {
        return Err(AuthError::Validation("Username is too long".to_string()));
    }
    if password.is_empty() {
        return Err(AuthError::Validation("Password cannot be empty".to_string()));
    }
    Ok(())
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn add_user(&self, username: &str, password: &str) -> Result<i32, AuthError> {
        validate_credentials(username, password)?;

        let id = self
            .store
            .add_user(username, password)
            .await?
            .ok_or_else(|| AuthError::Conflict(username.to_string()))?;

        info!(username, "User created");
        Ok(id)
    }

    async fn change_password(&self, username: &str, password: &str) -> Result<(), AuthError> {
        validate_credentials(username, password)?;

        if !self.store.change_user_password(username, password).await? {
            return Err(AuthError::UserNotFound(username.to_string()));
        }

        info!(username, "Password changed");
        Ok(())
    }

    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<i32>, AuthError> {
        Ok(self.store.authenticate_user(username, password).await?)
    }

    async fn remove_user(&self, username: &str) -> Result<(), AuthError> {
        if !self.store.remove_user(username).await? {
            return Err(AuthError::UserNotFound(username.to_string()));
        }

        info!(username, "User removed");
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<String>, AuthError> {
        Ok(self.store.list_users().await?)
    }

    async fn user_exists(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self.store.user_exists(username).await?)
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let Some(user_id) = self.store.authenticate_user(username, password).await? else {
            warn!(username, "Failed login attempt");
            return Err(AuthError::InvalidCredentials);
        };

        let session = self.store.create_session(user_id).await?;
        info!(username, "User logged in");

        Ok(LoginResult {
            user_id,
            username: username.to_string(),
            token: session.token,
            csrf_token: session.csrf_token,
            expires_at: session.expires_at,
        })
    }

    async fn session(&self, token: &str) -> Result<Option<SessionInfo>, AuthError> {
        match self.store.get_session(token).await? {
            SessionLookup::Active(info) => Ok(Some(info)),
            SessionLookup::Expired | SessionLookup::NotFound => Ok(None),
        }
    }

    async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.store.end_session(token).await?;
        Ok(())
    }

    async fn clean_up_sessions(&self) -> Result<u64, AuthError> {
        let removed = self.store.clean_up_sessions().await?;
        if removed > 0 {
            info!(removed, "Removed expired sessions");
        }
        Ok(removed)
    }

    async fn create_api_key(&self, name: &str) -> Result<String, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::Validation("Key name cannot be empty".to_string()));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(AuthError::Validation("Key name is too long".to_string()));
        }

        let key = self.store.create_api_key(name).await?;
        info!(name, "API key created");
        Ok(key)
    }

    async fn verify_api_key(&self, key: &str) -> Result<Option<String>, AuthError> {
        if key.is_empty() {
            return Ok(None);
        }
        Ok(self.store.check_api_key(key).await?)
    }

    async fn list_api_keys(&self) -> Result<Vec<ApiKey>, AuthError> {
        Ok(self.store.list_api_keys().await?)
    }

    async fn delete_api_key(&self, id: i32) -> Result<(), AuthError> {
        if !self.store.delete_api_key(id).await? {
            return Err(AuthError::KeyNotFound(id));
        }

        info!(id, "API key deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_store;

    async fn service() -> SeaOrmAuthService {
        SeaOrmAuthService::new(test_store().await)
    }

    #[tokio::test]
    async fn duplicate_user_is_a_conflict() {
        let auth = service().await;
        auth.add_user("alice", "pw").await.unwrap();

        let err = auth.add_user("alice", "other").await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict(name) if name == "alice"));
    }

    #[tokio::test]
    async fn empty_credentials_are_rejected() {
        let auth = service().await;
        assert!(matches!(
            auth.add_user("  ", "pw").await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            auth.add_user("alice", "").await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            auth.change_password("ghost", "pw").await,
            Err(AuthError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn login_and_logout() {
        let auth = service().await;
        let id = auth.add_user("alice", "pw").await.unwrap();

        assert!(matches!(
            auth.login("alice", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody", "pw").await,
            Err(AuthError::InvalidCredentials)
        ));

        let login = auth.login("alice", "pw").await.unwrap();
        assert_eq!(login.user_id, id);

        let session = auth.session(&login.token).await.unwrap().unwrap();
        assert_eq!(session.username, "alice");
        assert_eq!(session.csrf_token, login.csrf_token);

        auth.logout(&login.token).await.unwrap();
        assert!(auth.session(&login.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn api_key_lifecycle() {
        let auth = service().await;
        assert!(matches!(
            auth.create_api_key(" ").await,
            Err(AuthError::Validation(_))
        ));

        let key = auth.create_api_key("bookmarklet").await.unwrap();
        assert_eq!(
            auth.verify_api_key(&key).await.unwrap().as_deref(),
            Some("bookmarklet")
        );
        assert_eq!(auth.verify_api_key("").await.unwrap(), None);

        let id = auth.list_api_keys().await.unwrap()[0].id;
        auth.delete_api_key(id).await.unwrap();
        assert!(matches!(
            auth.delete_api_key(id).await,
            Err(AuthError::KeyNotFound(_))
        ));
        assert_eq!(auth.verify_api_key(&key).await.unwrap(), None);
    }
}
