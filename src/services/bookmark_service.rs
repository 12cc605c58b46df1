//! Domain service for bookmarks and tags.

use thiserror::Error;

use crate::constants::limits::{MAX_NAME_LENGTH, MAX_URL_LENGTH};
use crate::models::bookmark::{Bookmark, BookmarkInput, BookmarkQuery, TagCount};

#[derive(Debug, Error)]
pub enum BookmarkError {
    #[error("Bookmark not found: {0}")]
    NotFound(i32),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for BookmarkError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for BookmarkError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

#[async_trait::async_trait]
pub trait BookmarkService: Send + Sync {
    /// One page of bookmarks matching the query, tags included.
    async fn list(&self, query: &BookmarkQuery) -> Result<Vec<Bookmark>, BookmarkError>;

    /// Total matches for the query's search and tag filter.
    async fn count(&self, query: &BookmarkQuery) -> Result<u64, BookmarkError>;

    /// # Errors
    ///
    /// Returns [`BookmarkError::NotFound`] if the bookmark does not exist.
    async fn get(&self, id: i32) -> Result<Bookmark, BookmarkError>;

    /// Stores a new bookmark with its tags in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`BookmarkError::Validation`] if name or URL is missing.
    async fn create(&self, input: BookmarkInput) -> Result<i32, BookmarkError>;

    /// Replaces name, URL, description and the full tag set.
    async fn update(&self, id: i32, input: BookmarkInput) -> Result<(), BookmarkError>;

    async fn delete(&self, id: i32) -> Result<(), BookmarkError>;

    /// Every bookmark, for backup.
    async fn export(&self) -> Result<Vec<Bookmark>, BookmarkError>;

    /// Tags with the number of bookmarks carrying each, alphabetical.
    async fn tags(&self) -> Result<Vec<TagCount>, BookmarkError>;
}

/// Trims fields, requires a name and URL, and defaults the URL scheme to https.
pub fn normalize_input(input: BookmarkInput) -> Result<BookmarkInput, BookmarkError> {
    let name = input.name.trim().to_string();
    let url = input.url.trim();

    if name.is_empty() {
        return Err(BookmarkError::Validation("Name cannot be empty".to_string()));
    }
    if url.is_empty() {
        return Err(BookmarkError::Validation("URL cannot be empty".to_string()));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(BookmarkError::Validation("Name is too long".to_string()));
    }
    if url.len() > MAX_URL_LENGTH {
        return Err(BookmarkError::Validation("URL is too long".to_string()));
    }

    Ok(BookmarkInput {
        name,
        url: ensure_protocol(url),
        description: input.description.trim().to_string(),
        tags: input.tags,
    })
}

#[must_use]
pub fn ensure_protocol(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_is_added_when_missing() {
        assert_eq!(ensure_protocol("example.com"), "https://example.com");
        assert_eq!(ensure_protocol("http://example.com"), "http://example.com");
        assert_eq!(ensure_protocol("https://example.com/a"), "https://example.com/a");
    }

    #[test]
    fn input_requires_name_and_url() {
        let ok = normalize_input(BookmarkInput {
            name: "  Docs ".to_string(),
            url: " docs.rs ".to_string(),
            description: String::new(),
            tags: vec!["rust".to_string()],
        })
        .unwrap();
        assert_eq!(ok.name, "Docs");
        assert_eq!(ok.url, "https://docs.rs");

        assert!(matches!(
            normalize_input(BookmarkInput {
                url: "x".to_string(),
                ..Default::default()
            }),
            Err(BookmarkError::Validation(_))
        ));
        assert!(matches!(
            normalize_input(BookmarkInput {
                name: "x".to_string(),
                ..Default::default()
            }),
            Err(BookmarkError::Validation(_))
        ));
    }
}
