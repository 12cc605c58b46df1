use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::{info, warn};

use crate::constants::auth::SESSION_TOKEN_BYTES;
use crate::db::{format_timestamp, parse_timestamp};
use crate::entities::{sessions, users};

/// A freshly created login session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub token: String,
    pub csrf_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// The authenticated user behind a session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub user_id: i32,
    pub username: String,
    pub csrf_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLookup {
    Active(SessionInfo),
    /// The session was past its lifetime and has been removed.
    Expired,
    NotFound,
}

pub struct SessionRepository {
    conn: DatabaseConnection,
    ttl: chrono::Duration,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection, ttl: chrono::Duration) -> Self {
        Self { conn, ttl }
    }

    pub async fn create(&self, user_id: i32) -> Result<NewSession> {
        let token = generate_token();
        let csrf_token = generate_token();
        let created_at = Utc::now();

        let active = sessions::ActiveModel {
            cookie: Set(token.clone()),
            user_id: Set(user_id),
            timestamp: Set(format_timestamp(created_at)),
            csrf: Set(csrf_token.clone()),
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert session")?;

        Ok(NewSession {
            token,
            csrf_token,
            created_at,
            expires_at: created_at + self.ttl,
        })
    }

    pub async fn get(&self, token: &str) -> Result<SessionLookup> {
        let row = sessions::Entity::find_by_id(token.to_string())
            .find_also_related(users::Entity)
            .one(&self.conn)
            .await
            .context("Failed to query session")?;

        let Some((session, user)) = row else {
            return Ok(SessionLookup::NotFound);
        };

        let created_at = parse_timestamp(&session.timestamp)?;
        if Utc::now() - created_at > self.ttl {
            info!(user_id = session.user_id, "Session expired");
            self.delete(token).await?;
            return Ok(SessionLookup::Expired);
        }

        let Some(user) = user else {
            warn!(user_id = session.user_id, "Session references a missing user");
            self.delete(token).await?;
            return Ok(SessionLookup::NotFound);
        };

        Ok(SessionLookup::Active(SessionInfo {
            user_id: user.id,
            username: user.username,
            csrf_token: session.csrf,
        }))
    }

    pub async fn delete(&self, token: &str) -> Result<bool> {
        let result = sessions::Entity::delete_by_id(token.to_string())
            .exec(&self.conn)
            .await
            .context("Failed to delete session")?;

        Ok(result.rows_affected > 0)
    }

    /// Removes every session created more than one lifetime ago.
    pub async fn clean_up(&self) -> Result<u64> {
        let cutoff = format_timestamp(Utc::now() - self.ttl);

        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::Timestamp.lt(cutoff))
            .exec(&self.conn)
            .await
            .context("Failed to clean up sessions")?;

        Ok(result.rows_affected)
    }
}

/// URL-safe base64 of 32 random bytes.
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    rand::rng().fill(&mut bytes[..]);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_store;
    use sea_orm::PaginatorTrait;

    async fn backdate(store: &crate::db::Store, token: &str, days: i64) {
        let session = sessions::Entity::find_by_id(token.to_string())
            .one(&store.conn)
            .await
            .unwrap()
            .unwrap();
        let mut active: sessions::ActiveModel = session.into();
        active.timestamp = Set(format_timestamp(Utc::now() - chrono::Duration::days(days)));
        active.update(&store.conn).await.unwrap();
    }

    #[tokio::test]
    async fn create_and_lookup() {
        let store = test_store().await;
        let user_id = store.add_user("alice", "pw").await.unwrap().unwrap();

        let session = store.create_session(user_id).await.unwrap();
        assert_ne!(session.token, session.csrf_token);
        assert_eq!(session.expires_at - session.created_at, chrono::Duration::days(30));

        let lookup = store.get_session(&session.token).await.unwrap();
        assert_eq!(
            lookup,
            SessionLookup::Active(SessionInfo {
                user_id,
                username: "alice".to_string(),
                csrf_token: session.csrf_token.clone(),
            })
        );

        assert_eq!(
            store.get_session("not-a-token").await.unwrap(),
            SessionLookup::NotFound
        );
    }

    #[tokio::test]
    async fn each_login_gets_its_own_session() {
        let store = test_store().await;
        let user_id = store.add_user("alice", "pw").await.unwrap().unwrap();

        let first = store.create_session(user_id).await.unwrap();
        let second = store.create_session(user_id).await.unwrap();
        assert_ne!(first.token, second.token);

        assert!(store.end_session(&first.token).await.unwrap());
        assert_eq!(
            store.get_session(&first.token).await.unwrap(),
            SessionLookup::NotFound
        );
        assert!(matches!(
            store.get_session(&second.token).await.unwrap(),
            SessionLookup::Active(_)
        ));
    }

    #[tokio::test]
    async fn expired_session_is_removed() {
        let store = test_store().await;
        let user_id = store.add_user("alice", "pw").await.unwrap().unwrap();
        let session = store.create_session(user_id).await.unwrap();

        backdate(&store, &session.token, 31).await;

        assert_eq!(
            store.get_session(&session.token).await.unwrap(),
            SessionLookup::Expired
        );
        assert_eq!(
            store.get_session(&session.token).await.unwrap(),
            SessionLookup::NotFound
        );
    }

    #[tokio::test]
    async fn clean_up_only_touches_old_sessions() {
        let store = test_store().await;
        let user_id = store.add_user("alice", "pw").await.unwrap().unwrap();
        let old = store.create_session(user_id).await.unwrap();
        let fresh = store.create_session(user_id).await.unwrap();

        backdate(&store, &old.token, 40).await;

        assert_eq!(store.clean_up_sessions().await.unwrap(), 1);
        let remaining = sessions::Entity::find().count(&store.conn).await.unwrap();
        assert_eq!(remaining, 1);
        assert!(matches!(
            store.get_session(&fresh.token).await.unwrap(),
            SessionLookup::Active(_)
        ));
    }

    #[tokio::test]
    async fn removing_user_drops_sessions() {
        let store = test_store().await;
        let user_id = store.add_user("alice", "pw").await.unwrap().unwrap();
        let session = store.create_session(user_id).await.unwrap();

        store.remove_user("alice").await.unwrap();
        assert_eq!(
            store.get_session(&session.token).await.unwrap(),
            SessionLookup::NotFound
        );
    }

    #[test]
    fn tokens_are_url_safe() {
        let token = generate_token();
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }
}
