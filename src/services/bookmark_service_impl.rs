//! `SeaORM` implementation of the `BookmarkService` trait.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::db::Store;
use crate::models::bookmark::{Bookmark, BookmarkInput, BookmarkQuery, TagCount};
use crate::services::bookmark_service::{BookmarkError, BookmarkService, normalize_input};

pub struct SeaOrmBookmarkService {
    store: Store,
    case_sensitive: bool,
}

impl SeaOrmBookmarkService {
    #[must_use]
    pub const fn new(store: Store, case_sensitive: bool) -> Self {
        Self {
            store,
            case_sensitive,
        }
    }

    /// Runs after the bookmark transaction has committed; failures only get logged.
    async fn prune_tags(&self) {
        match self.store.delete_dangling_tags().await {
            Ok(0) => {}
            Ok(removed) => info!(removed, "Pruned unused tags"),
            Err(e) => warn!(error = %e, "Failed to delete dangling tags"),
        }
    }
}

#[async_trait]
impl BookmarkService for SeaOrmBookmarkService {
    async fn list(&self, query: &BookmarkQuery) -> Result<Vec<Bookmark>, BookmarkError> {
        Ok(self.store.get_bookmarks(query, self.case_sensitive).await?)
    }

    async fn count(&self, query: &BookmarkQuery) -> Result<u64, BookmarkError> {
        Ok(self.store.count_bookmarks(query, self.case_sensitive).await?)
    }

    async fn get(&self, id: i32) -> Result<Bookmark, BookmarkError> {
        self.store
            .get_bookmark(id)
            .await?
            .ok_or(BookmarkError::NotFound(id))
    }

    async fn create(&self, input: BookmarkInput) -> Result<i32, BookmarkError> {
        let input = normalize_input(input)?;
        let id = self.store.create_bookmark(&input).await?;
        info!(id, url = %input.url, "Bookmark created");
        Ok(id)
    }

    async fn update(&self, id: i32, input: BookmarkInput) -> Result<(), BookmarkError> {
        let input = normalize_input(input)?;
        if !self.store.update_bookmark(id, &input).await? {
            return Err(BookmarkError::NotFound(id));
        }
        self.prune_tags().await;
        info!(id, "Bookmark updated");
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), BookmarkError> {
        if !self.store.delete_bookmark(id).await? {
            return Err(BookmarkError::NotFound(id));
        }
        self.prune_tags().await;
        info!(id, "Bookmark deleted");
        Ok(())
    }

    async fn export(&self) -> Result<Vec<Bookmark>, BookmarkError> {
        Ok(self.store.export_bookmarks().await?)
    }

    async fn tags(&self) -> Result<Vec<TagCount>, BookmarkError> {
        Ok(self.store.get_tags().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_store;

    fn input(name: &str, url: &str, tags: &[&str]) -> BookmarkInput {
        BookmarkInput {
            name: name.to_string(),
            url: url.to_string(),
            description: String::new(),
            tags: tags.iter().map(ToString::to_string).collect(),
        }
    }

    #[tokio::test]
    async fn update_prunes_dropped_tags() {
        let service = SeaOrmBookmarkService::new(test_store().await, false);
        let id = service
            .create(input("a", "example.com", &["a", "b"]))
            .await
            .unwrap();

        assert_eq!(service.get(id).await.unwrap().url, "https://example.com");

        service
            .update(id, input("a", "example.com", &["b", "c"]))
            .await
            .unwrap();

        let names: Vec<String> = service
            .tags()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn missing_bookmarks_are_not_found() {
        let service = SeaOrmBookmarkService::new(test_store().await, false);

        assert!(matches!(service.get(7).await, Err(BookmarkError::NotFound(7))));
        assert!(matches!(service.delete(7).await, Err(BookmarkError::NotFound(7))));
        assert!(matches!(
            service.update(7, input("a", "b", &[])).await,
            Err(BookmarkError::NotFound(7))
        ));
        assert!(matches!(
            service.create(input("", "b", &[])).await,
            Err(BookmarkError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_orphaned_tags() {
        let service = SeaOrmBookmarkService::new(test_store().await, false);
        let id = service.create(input("a", "a.com", &["solo"])).await.unwrap();

        service.delete(id).await.unwrap();
        assert!(service.tags().await.unwrap().is_empty());
        assert_eq!(service.count(&BookmarkQuery::default()).await.unwrap(), 0);
    }
}
