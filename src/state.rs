use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, BookmarkService, SeaOrmAuthService, SeaOrmBookmarkService};

/// Long-lived handles shared by every request.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub bookmark_service: Arc<dyn BookmarkService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
            config.security.clone(),
        )
        .await?;

        Ok(Self::with_store(config, store))
    }

    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let auth_service: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(store.clone()));
        let bookmark_service: Arc<dyn BookmarkService> = Arc::new(SeaOrmBookmarkService::new(
            store.clone(),
            config.search.case_sensitive,
        ));

        Self {
            config: Arc::new(config),
            store,
            auth_service,
            bookmark_service,
        }
    }
}
