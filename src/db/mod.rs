use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::models::bookmark::{Bookmark, BookmarkInput, BookmarkQuery, TagCount};

pub mod migrator;
pub mod repositories;

pub use repositories::api_key::ApiKey;
pub use repositories::session::{NewSession, SessionInfo, SessionLookup};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
    security: SecurityConfig,
}

impl Store {
    pub async fn new(db_url: &str, security: SecurityConfig) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1, security).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
        security: SecurityConfig,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)
                    .with_context(|| format!("Failed to create database file: {path_str}"))?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        // Every pooled connection would otherwise get its own empty in-memory database
        if !db_url.contains(":memory:") {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn, security })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    // ========== Credential Store ==========

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone(), self.security.clone())
    }

    /// Returns `None` when the username is already taken.
    pub async fn add_user(&self, username: &str, password: &str) -> Result<Option<i32>> {
        self.user_repo().add(username, password).await
    }

    pub async fn change_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().change_password(username, password).await
    }

    pub async fn authenticate_user(&self, username: &str, password: &str) -> Result<Option<i32>> {
        self.user_repo().authenticate(username, password).await
    }

    pub async fn remove_user(&self, username: &str) -> Result<bool> {
        self.user_repo().remove(username).await
    }

    pub async fn list_users(&self) -> Result<Vec<String>> {
        self.user_repo().list().await
    }

    pub async fn user_exists(&self, username: &str) -> Result<bool> {
        self.user_repo().exists(username).await
    }

    // ========== Session Manager ==========

    fn session_repo(&self) -> repositories::session::SessionRepository {
        repositories::session::SessionRepository::new(
            self.conn.clone(),
            self.security.session_ttl(),
        )
    }

    pub async fn create_session(&self, user_id: i32) -> Result<NewSession> {
        self.session_repo().create(user_id).await
    }

    pub async fn get_session(&self, token: &str) -> Result<SessionLookup> {
        self.session_repo().get(token).await
    }

    pub async fn end_session(&self, token: &str) -> Result<bool> {
        self.session_repo().delete(token).await
    }

    pub async fn clean_up_sessions(&self) -> Result<u64> {
        self.session_repo().clean_up().await
    }

    // ========== API Key Store ==========

    fn api_key_repo(&self) -> repositories::api_key::ApiKeyRepository {
        repositories::api_key::ApiKeyRepository::new(self.conn.clone())
    }

    pub async fn create_api_key(&self, name: &str) -> Result<String> {
        self.api_key_repo().create(name).await
    }

    pub async fn check_api_key(&self, key: &str) -> Result<Option<String>> {
        self.api_key_repo().check(key).await
    }

    pub async fn list_api_keys(&self) -> Result<Vec<ApiKey>> {
        self.api_key_repo().list().await
    }

    pub async fn delete_api_key(&self, id: i32) -> Result<bool> {
        self.api_key_repo().delete(id).await
    }

    // ========== Bookmarks & Tags ==========

    fn bookmark_repo(&self, case_sensitive: bool) -> repositories::bookmark::BookmarkRepository {
        repositories::bookmark::BookmarkRepository::new(self.conn.clone(), case_sensitive)
    }

    fn tag_repo(&self) -> repositories::tag::TagRepository {
        repositories::tag::TagRepository::new(self.conn.clone())
    }

    pub async fn get_bookmarks(
        &self,
        query: &BookmarkQuery,
        case_sensitive: bool,
    ) -> Result<Vec<Bookmark>> {
        self.bookmark_repo(case_sensitive).list(query).await
    }

    pub async fn count_bookmarks(&self, query: &BookmarkQuery, case_sensitive: bool) -> Result<u64> {
        self.bookmark_repo(case_sensitive).count(query).await
    }

    pub async fn get_bookmark(&self, id: i32) -> Result<Option<Bookmark>> {
        self.bookmark_repo(false).get(id).await
    }

    pub async fn create_bookmark(&self, input: &BookmarkInput) -> Result<i32> {
        self.bookmark_repo(false).create(input).await
    }

    pub async fn update_bookmark(&self, id: i32, input: &BookmarkInput) -> Result<bool> {
        self.bookmark_repo(false).update(id, input).await
    }

    pub async fn delete_bookmark(&self, id: i32) -> Result<bool> {
        self.bookmark_repo(false).delete(id).await
    }

    pub async fn export_bookmarks(&self) -> Result<Vec<Bookmark>> {
        self.bookmark_repo(false).export().await
    }

    pub async fn delete_dangling_tags(&self) -> Result<u64> {
        self.tag_repo().delete_dangling().await
    }

    pub async fn get_tags(&self) -> Result<Vec<TagCount>> {
        self.tag_repo().list_with_counts().await
    }
}

/// Fixed-width UTC timestamp; lexical order equals chronological order.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Malformed timestamp: {value}"))?;
    Ok(parsed.with_timezone(&Utc))
}

#[cfg(test)]
pub(crate) async fn test_store() -> Store {
    let security = SecurityConfig {
        argon2_memory_cost_kib: 64,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
        session_ttl_days: 30,
    };
    Store::with_pool_options("sqlite::memory:", 1, 1, security)
        .await
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_sort_lexically() {
        let early = Utc::now();
        let late = early + chrono::Duration::milliseconds(1500);
        let a = format_timestamp(early);
        let b = format_timestamp(late);
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert!(a.ends_with('Z'));
    }

    #[test]
    fn timestamp_parse_round_trips_to_micros() {
        let now = Utc::now();
        let parsed = parse_timestamp(&format_timestamp(now)).unwrap();
        assert_eq!(parsed.timestamp_micros(), now.timestamp_micros());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[tokio::test]
    async fn in_memory_store_migrates_and_pings() {
        let store = test_store().await;
        store.ping().await.unwrap();
        assert!(store.list_users().await.unwrap().is_empty());
    }
}
