use anyhow::{Context, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::constants::auth::{HASH_BYTES, SALT_BYTES};
use crate::entities::{sessions, users};

pub struct UserRepository {
    conn: DatabaseConnection,
    security: SecurityConfig,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection, security: SecurityConfig) -> Self {
        Self { conn, security }
    }

    /// Creates a user. Returns `None` if the username already exists.
    pub async fn add(&self, username: &str, password: &str) -> Result<Option<i32>> {
        let (salt, password_hash) = self.derive_with_fresh_salt(password).await?;

        let active = users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            salt: Set(salt),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Some(model.id)),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(None)
            }
            Err(err) => Err(err).context("Failed to insert user"),
        }
    }

    /// Rotates the salt and hash. Returns `false` if the user does not exist.
    pub async fn change_password(&self, username: &str, password: &str) -> Result<bool> {
        let Some(user) = self.find(username).await? else {
            return Ok(false);
        };

        let (salt, password_hash) = self.derive_with_fresh_salt(password).await?;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(password_hash);
        active.salt = Set(salt);
        active
            .update(&self.conn)
            .await
            .context("Failed to update password")?;

        Ok(true)
    }

    /// Returns the user id when the password matches.
    /// Unknown users and wrong passwords both yield `None`.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<i32>> {
        let Some(user) = self.find(username).await? else {
            return Ok(None);
        };

        let derived = self.derive(password, user.salt.clone()).await?;

        if constant_time_eq(derived.as_bytes(), user.password_hash.as_bytes()) {
            Ok(Some(user.id))
        } else {
            Ok(None)
        }
    }

    /// Deletes the user together with their sessions.
    pub async fn remove(&self, username: &str) -> Result<bool> {
        let Some(user) = self.find(username).await? else {
            return Ok(false);
        };

        let txn = self.conn.begin().await?;

        sessions::Entity::delete_many()
            .filter(sessions::Column::UserId.eq(user.id))
            .exec(&txn)
            .await
            .context("Failed to delete user sessions")?;

        let result = users::Entity::delete_by_id(user.id)
            .exec(&txn)
            .await
            .context("Failed to delete user")?;

        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn list(&self) -> Result<Vec<String>> {
        let names = users::Entity::find()
            .select_only()
            .column(users::Column::Username)
            .order_by_asc(users::Column::Username)
            .into_tuple::<String>()
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(names)
    }

    pub async fn exists(&self, username: &str) -> Result<bool> {
        let count = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .count(&self.conn)
            .await
            .context("Failed to check user existence")?;

        Ok(count > 0)
    }

    async fn find(&self, username: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")
    }

    async fn derive_with_fresh_salt(&self, password: &str) -> Result<(String, String)> {
        let salt = generate_salt();
        let hash = self.derive(password, salt.clone()).await?;
        Ok((salt, hash))
    }

    /// Argon2 is CPU and memory heavy, so it runs off the async workers.
    async fn derive(&self, password: &str, salt: String) -> Result<String> {
        let password = password.to_string();
        let security = self.security.clone();

        task::spawn_blocking(move || derive_key(&password, &salt, &security))
            .await
            .context("Password hashing task panicked")?
    }
}

/// Derives a hex-encoded key from `password` and the hex salt string.
pub fn derive_key(password: &str, salt: &str, config: &SecurityConfig) -> Result<String> {
    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        Some(HASH_BYTES),
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = [0u8; HASH_BYTES];
    argon2
        .hash_password_into(password.as_bytes(), salt.as_bytes(), &mut output)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(to_hex(&output))
}

#[must_use]
pub fn generate_salt() -> String {
    use rand::Rng;

    let mut bytes = [0u8; SALT_BYTES];
    rand::rng().fill(&mut bytes[..]);
    to_hex(&bytes)
}

#[must_use]
pub fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut acc, b| {
            use std::fmt::Write;
            let _ = write!(acc, "{b:02x}");
            acc
        })
}

/// Compares two byte strings without short-circuiting on the first difference.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_store;

    #[tokio::test]
    async fn add_then_authenticate() {
        let store = test_store().await;
        let id = store.add_user("alice", "hunter2").await.unwrap().unwrap();

        assert_eq!(store.authenticate_user("alice", "hunter2").await.unwrap(), Some(id));
        assert_eq!(store.authenticate_user("alice", "hunter3").await.unwrap(), None);
        assert_eq!(store.authenticate_user("bob", "hunter2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let store = test_store().await;
        assert!(store.add_user("alice", "one").await.unwrap().is_some());
        assert!(store.add_user("alice", "two").await.unwrap().is_none());

        // The original password still works
        assert!(store.authenticate_user("alice", "one").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn change_password_rotates_salt() {
        let store = test_store().await;
        store.add_user("alice", "old").await.unwrap();

        let before = users::Entity::find().one(&store.conn).await.unwrap().unwrap();
        assert!(store.change_user_password("alice", "new").await.unwrap());
        let after = users::Entity::find().one(&store.conn).await.unwrap().unwrap();

        assert_ne!(before.salt, after.salt);
        assert_ne!(before.password_hash, after.password_hash);
        assert!(store.authenticate_user("alice", "old").await.unwrap().is_none());
        assert!(store.authenticate_user("alice", "new").await.unwrap().is_some());

        assert!(!store.change_user_password("nobody", "x").await.unwrap());
    }

    #[tokio::test]
    async fn remove_list_and_exists() {
        let store = test_store().await;
        store.add_user("bob", "pw").await.unwrap();
        store.add_user("alice", "pw").await.unwrap();

        assert_eq!(store.list_users().await.unwrap(), vec!["alice", "bob"]);
        assert!(store.user_exists("bob").await.unwrap());

        assert!(store.remove_user("bob").await.unwrap());
        assert!(!store.remove_user("bob").await.unwrap());
        assert!(!store.user_exists("bob").await.unwrap());
        assert_eq!(store.list_users().await.unwrap(), vec!["alice"]);
    }

    #[test]
    fn salts_are_hex_and_unique() {
        let a = generate_salt();
        let b = generate_salt();
        assert_eq!(a.len(), SALT_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn constant_time_eq_matches_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }
}
