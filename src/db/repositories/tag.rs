use std::collections::HashMap;

use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, OnConflict, Query};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};

use crate::entities::{tag_bookmarks, tags};
use crate::models::bookmark::TagCount;

pub struct TagRepository {
    conn: DatabaseConnection,
}

impl TagRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Replaces the tag set of a bookmark. Meant to run inside the same
    /// transaction as the bookmark write.
    pub async fn set_bookmark_tags<C: ConnectionTrait>(
        conn: &C,
        bookmark_id: i32,
        tags: &[String],
    ) -> Result<()> {
        let mut tag_ids = Vec::new();

        for name in normalize_tags(tags) {
            tags::Entity::insert(tags::ActiveModel {
                name: Set(name.clone()),
                ..Default::default()
            })
            .on_conflict(OnConflict::column(tags::Column::Name).do_nothing().to_owned())
            .exec_without_returning(conn)
            .await
            .with_context(|| format!("Failed to insert tag {name}"))?;

            let tag_id: i32 = tags::Entity::find()
                .select_only()
                .column(tags::Column::Id)
                .filter(tags::Column::Name.eq(&name))
                .into_tuple::<i32>()
                .one(conn)
                .await
                .context("Failed to look up tag")?
                .with_context(|| format!("Tag {name} missing after insert"))?;

            tag_bookmarks::Entity::insert(tag_bookmarks::ActiveModel {
                tag_id: Set(tag_id),
                bookmark_id: Set(bookmark_id),
            })
            .on_conflict(
                OnConflict::columns([
                    tag_bookmarks::Column::TagId,
                    tag_bookmarks::Column::BookmarkId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .context("Failed to associate tag")?;

            tag_ids.push(tag_id);
        }

        let mut stale = tag_bookmarks::Entity::delete_many()
            .filter(tag_bookmarks::Column::BookmarkId.eq(bookmark_id));
        if !tag_ids.is_empty() {
            stale = stale.filter(tag_bookmarks::Column::TagId.is_not_in(tag_ids));
        }
        stale
            .exec(conn)
            .await
            .context("Failed to remove stale tag associations")?;

        Ok(())
    }

    /// Tag names per bookmark, alphabetical. `None` loads every association.
    pub async fn tags_for_bookmarks<C: ConnectionTrait>(
        conn: &C,
        bookmark_ids: Option<&[i32]>,
    ) -> Result<HashMap<i32, Vec<String>>> {
        let mut select = tag_bookmarks::Entity::find()
            .select_only()
            .column(tag_bookmarks::Column::BookmarkId)
            .column(tags::Column::Name)
            .join(JoinType::InnerJoin, tag_bookmarks::Relation::Tag.def());

        if let Some(ids) = bookmark_ids {
            if ids.is_empty() {
                return Ok(HashMap::new());
            }
            select = select.filter(tag_bookmarks::Column::BookmarkId.is_in(ids.iter().copied()));
        }

        let rows: Vec<(i32, String)> = select
            .order_by_asc(tags::Column::Name)
            .into_tuple()
            .all(conn)
            .await
            .context("Failed to load bookmark tags")?;

        let mut by_bookmark: HashMap<i32, Vec<String>> = HashMap::new();
        for (bookmark_id, name) in rows {
            by_bookmark.entry(bookmark_id).or_default().push(name);
        }

        Ok(by_bookmark)
    }

    /// Deletes tags that no bookmark references.
    pub async fn delete_dangling(&self) -> Result<u64> {
        let result = tags::Entity::delete_many()
            .filter(
                tags::Column::Id.not_in_subquery(
                    Query::select()
                        .column(tag_bookmarks::Column::TagId)
                        .from(tag_bookmarks::Entity)
                        .to_owned(),
                ),
            )
            .exec(&self.conn)
            .await
            .context("Failed to delete dangling tags")?;

        Ok(result.rows_affected)
    }

    pub async fn list_with_counts(&self) -> Result<Vec<TagCount>> {
        let rows: Vec<(String, i64)> = tags::Entity::find()
            .select_only()
            .column(tags::Column::Name)
            .column_as(
                Expr::col((tag_bookmarks::Entity, tag_bookmarks::Column::BookmarkId)).count(),
                "count",
            )
            .join(JoinType::InnerJoin, tags::Relation::TagBookmarks.def())
            .group_by(tags::Column::Id)
            .group_by(tags::Column::Name)
            .order_by_asc(tags::Column::Name)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to list tags")?;

        Ok(rows
            .into_iter()
            .map(|(name, count)| TagCount { name, count })
            .collect())
    }
}

/// Lowercases and trims, dropping empties and duplicates while keeping order.
#[must_use]
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = Vec::with_capacity(tags.len());
    for tag in tags {
        let name = tag.trim().to_lowercase();
        if !name.is_empty() && !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn normalize_folds_case_and_drops_noise() {
        assert_eq!(
            normalize_tags(&strings(&["Rust", " rust ", "", "  ", "Web", "WEB"])),
            strings(&["rust", "web"])
        );
        assert!(normalize_tags(&[]).is_empty());
    }
}
