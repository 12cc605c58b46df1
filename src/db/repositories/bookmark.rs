use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::sea_query::{Alias, Condition, Expr, Func, LikeExpr, Query, SelectStatement};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};

use crate::db::format_timestamp;
use crate::db::repositories::tag::{TagRepository, normalize_tags};
use crate::entities::{bookmarks, tag_bookmarks, tags};
use crate::models::bookmark::{Bookmark, BookmarkInput, BookmarkQuery};

pub struct BookmarkRepository {
    conn: DatabaseConnection,
    case_sensitive: bool,
}

impl BookmarkRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection, case_sensitive: bool) -> Self {
        Self {
            conn,
            case_sensitive,
        }
    }

    pub async fn list(&self, query: &BookmarkQuery) -> Result<Vec<Bookmark>> {
        let mut select = self.filtered(query);

        select = if query.reverse {
            select
                .order_by_asc(bookmarks::Column::Date)
                .order_by_asc(bookmarks::Column::Id)
        } else {
            select
                .order_by_desc(bookmarks::Column::Date)
                .order_by_desc(bookmarks::Column::Id)
        };

        if let Some(limit) = query.limit {
            select = select.limit(limit);
        }
        if query.offset > 0 {
            select = select.offset(query.offset);
        }

        let rows = select
            .all(&self.conn)
            .await
            .context("Failed to query bookmarks")?;

        let ids: Vec<i32> = rows.iter().map(|b| b.id).collect();
        let mut tags = TagRepository::tags_for_bookmarks(&self.conn, Some(ids.as_slice())).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let row_tags = tags.remove(&row.id).unwrap_or_default();
                with_tags(row, row_tags)
            })
            .collect())
    }

    /// Number of bookmarks matching the search and tag filter, ignoring paging.
    pub async fn count(&self, query: &BookmarkQuery) -> Result<u64> {
        self.filtered(query)
            .count(&self.conn)
            .await
            .context("Failed to count bookmarks")
    }

    pub async fn get(&self, id: i32) -> Result<Option<Bookmark>> {
        let Some(row) = bookmarks::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query bookmark")?
        else {
            return Ok(None);
        };

        let mut tags =
            TagRepository::tags_for_bookmarks(&self.conn, Some(std::slice::from_ref(&id))).await?;
        Ok(Some(with_tags(row, tags.remove(&id).unwrap_or_default())))
    }

    pub async fn create(&self, input: &BookmarkInput) -> Result<i32> {
        let txn = self.conn.begin().await?;

        let model = bookmarks::ActiveModel {
            name: Set(input.name.clone()),
            date: Set(format_timestamp(Utc::now())),
            url: Set(input.url.clone()),
            description: Set(input.description.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert bookmark")?;

        TagRepository::set_bookmark_tags(&txn, model.id, &input.tags).await?;

        txn.commit().await?;

        Ok(model.id)
    }

    /// Returns `false` if there is no such bookmark. The creation date is kept.
    pub async fn update(&self, id: i32, input: &BookmarkInput) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let Some(existing) = bookmarks::Entity::find_by_id(id)
            .one(&txn)
            .await
            .context("Failed to query bookmark")?
        else {
            return Ok(false);
        };

        let mut active: bookmarks::ActiveModel = existing.into();
        active.name = Set(input.name.clone());
        active.url = Set(input.url.clone());
        active.description = Set(input.description.clone());
        active
            .update(&txn)
            .await
            .context("Failed to update bookmark")?;

        TagRepository::set_bookmark_tags(&txn, id, &input.tags).await?;

        txn.commit().await?;

        Ok(true)
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        tag_bookmarks::Entity::delete_many()
            .filter(tag_bookmarks::Column::BookmarkId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to delete bookmark tags")?;

        let result = bookmarks::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("Failed to delete bookmark")?;

        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }

    /// Every bookmark, newest first, with tags.
    pub async fn export(&self) -> Result<Vec<Bookmark>> {
        let rows = bookmarks::Entity::find()
            .order_by_desc(bookmarks::Column::Date)
            .order_by_desc(bookmarks::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query bookmarks for export")?;

        let mut tags = TagRepository::tags_for_bookmarks(&self.conn, None).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let row_tags = tags.remove(&row.id).unwrap_or_default();
                with_tags(row, row_tags)
            })
            .collect())
    }

    fn filtered(&self, query: &BookmarkQuery) -> Select<bookmarks::Entity> {
        let mut select = bookmarks::Entity::find();

        if let Some(term) = query.search.as_deref().filter(|t| !t.is_empty()) {
            select = select.filter(self.search_condition(term));
        }

        let wanted = normalize_tags(&query.tags);
        if !wanted.is_empty() {
            select = select.filter(bookmarks::Column::Id.in_subquery(tag_filter(&wanted)));
        }

        select
    }

    fn search_condition(&self, term: &str) -> Condition {
        let columns = [
            bookmarks::Column::Name,
            bookmarks::Column::Url,
            bookmarks::Column::Description,
        ];

        columns.into_iter().fold(Condition::any(), |cond, column| {
            let col = Expr::col((bookmarks::Entity, column));
            if self.case_sensitive {
                cond.add(
                    Expr::expr(Func::cust(Alias::new("instr")).arg(col).arg(term)).gt(0),
                )
            } else {
                cond.add(col.like(LikeExpr::new(format!("%{}%", escape_like(term))).escape('\\')))
            }
        })
    }
}

/// Ids of bookmarks carrying every one of `names`.
fn tag_filter(names: &[String]) -> SelectStatement {
    let required = i64::try_from(names.len()).unwrap_or(i64::MAX);

    Query::select()
        .column((tag_bookmarks::Entity, tag_bookmarks::Column::BookmarkId))
        .from(tag_bookmarks::Entity)
        .inner_join(
            tags::Entity,
            Expr::col((tags::Entity, tags::Column::Id))
                .equals((tag_bookmarks::Entity, tag_bookmarks::Column::TagId)),
        )
        .and_where(Expr::col((tags::Entity, tags::Column::Name)).is_in(names.iter().cloned()))
        .group_by_col((tag_bookmarks::Entity, tag_bookmarks::Column::BookmarkId))
        .and_having(
            Expr::expr(Func::count_distinct(Expr::col((tags::Entity, tags::Column::Id))))
                .eq(required),
        )
        .to_owned()
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn with_tags(row: bookmarks::Model, tags: Vec<String>) -> Bookmark {
    Bookmark {
        id: row.id,
        name: row.name,
        date: row.date,
        url: row.url,
        description: row.description,
        tags,
    }
}
