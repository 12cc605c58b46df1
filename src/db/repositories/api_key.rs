use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;

use crate::db::format_timestamp;
use crate::db::repositories::user::to_hex;
use crate::entities::api_keys;

#[derive(Debug, Clone, Serialize)]
pub struct ApiKey {
    pub id: i32,
    pub name: String,
    pub key: String,
    pub created_at: String,
}

impl From<api_keys::Model> for ApiKey {
    fn from(model: api_keys::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            key: model.key,
            created_at: model.timestamp,
        }
    }
}

pub struct ApiKeyRepository {
    conn: DatabaseConnection,
}

impl ApiKeyRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, name: &str) -> Result<String> {
        let key = generate_api_key();

        let active = api_keys::ActiveModel {
            name: Set(name.to_string()),
            key: Set(key.clone()),
            timestamp: Set(format_timestamp(Utc::now())),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert API key")?;

        Ok(key)
    }

    /// Returns the key's name when it exists.
    pub async fn check(&self, key: &str) -> Result<Option<String>> {
        let found = api_keys::Entity::find()
            .filter(api_keys::Column::Key.eq(key))
            .one(&self.conn)
            .await
            .context("Failed to query API key")?;

        Ok(found.map(|k| k.name))
    }

    pub async fn list(&self) -> Result<Vec<ApiKey>> {
        let keys = api_keys::Entity::find()
            .order_by_desc(api_keys::Column::Timestamp)
            .order_by_desc(api_keys::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list API keys")?;

        Ok(keys.into_iter().map(ApiKey::from).collect())
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = api_keys::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete API key")?;

        Ok(result.rows_affected > 0)
    }
}

/// Generate a random API key (64 character hex string)
#[must_use]
pub fn generate_api_key() -> String {
    use rand::Rng;

    let bytes: [u8; 32] = rand::rng().random();
    to_hex(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_store;

    #[tokio::test]
    async fn create_check_list_delete() {
        let store = test_store().await;

        let first = store.create_api_key("phone").await.unwrap();
        let second = store.create_api_key("laptop").await.unwrap();
        assert_eq!(first.len(), 64);
        assert_ne!(first, second);

        assert_eq!(
            store.check_api_key(&first).await.unwrap().as_deref(),
            Some("phone")
        );
        assert_eq!(store.check_api_key("bogus").await.unwrap(), None);

        let keys = store.list_api_keys().await.unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].name, "laptop");

        assert!(store.delete_api_key(keys[0].id).await.unwrap());
        assert!(!store.delete_api_key(keys[0].id).await.unwrap());
        assert_eq!(store.check_api_key(&second).await.unwrap(), None);
    }
}
