use serde::{Deserialize, Serialize};

/// A bookmark together with its tags, as shown on pages and in exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: i32,
    pub name: String,
    pub date: String,
    pub url: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// Fields accepted when creating or editing a bookmark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookmarkInput {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkQuery {
    /// Oldest first instead of newest first
    pub reverse: bool,
    pub search: Option<String>,
    /// Every listed tag must be present (AND)
    pub tags: Vec<String>,
    pub limit: Option<u64>,
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub name: String,
    pub count: i64,
}
