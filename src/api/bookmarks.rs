use axum::{
    Extension, Json,
    extract::{Path, State},
    response::Redirect,
};
use axum_extra::extract::{Form, Query};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentSession;
use super::pager::{Pager, page_count};
use super::params::{RawSearchParams, SearchParams};
use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, BookmarkView, IndexView};
use crate::models::bookmark::BookmarkInput;

/// Form posted by the new and edit pages; `tag` repeats once per tag.
#[derive(Debug, Deserialize)]
pub struct BookmarkForm {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "tag")]
    pub tags: Vec<String>,
}

impl From<BookmarkForm> for BookmarkInput {
    fn from(form: BookmarkForm) -> Self {
        Self {
            name: form.name,
            url: form.url,
            description: form.description,
            tags: form.tags,
        }
    }
}

pub async fn index() -> Redirect {
    Redirect::to("/bookmarks")
}

pub async fn list_bookmarks(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentSession>,
    Query(raw): Query<RawSearchParams>,
) -> Result<Json<ApiResponse<IndexView>>, ApiError> {
    let params = SearchParams::try_from(raw)?;
    let server = &state.config().server;

    let query = params.to_query(server.page_size)?;
    let bookmarks = state.bookmarks().list(&query).await?;
    let num_bookmarks = state.bookmarks().count(&query).await?;

    let last_page = page_count(num_bookmarks, server.page_size);
    let pager = Pager::new(params.page, last_page, server.pager_side_size)
        .links(|page| format!("/bookmarks{}", params.with_page(page).query_string()));

    Ok(Json(ApiResponse::success(IndexView {
        bookmarks,
        pager,
        search_params: params,
        num_bookmarks,
        csrf_token: current.info.csrf_token,
    })))
}

pub async fn view_bookmark(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<i32>,
    Query(raw): Query<RawSearchParams>,
) -> Result<Json<ApiResponse<BookmarkView>>, ApiError> {
    let id = validate_id("bookmark", id)?;
    let search_params = SearchParams::try_from(raw)?;
    let bookmark = state.bookmarks().get(id).await?;

    Ok(Json(ApiResponse::success(BookmarkView {
        bookmark,
        search_params,
        csrf_token: current.info.csrf_token,
    })))
}

/// The edit page shows the same data as the view page.
pub async fn edit_bookmark_page(
    state: State<Arc<AppState>>,
    current: Extension<CurrentSession>,
    id: Path<i32>,
    raw: Query<RawSearchParams>,
) -> Result<Json<ApiResponse<BookmarkView>>, ApiError> {
    view_bookmark(state, current, id, raw).await
}

pub async fn create_bookmark(
    State(state): State<Arc<AppState>>,
    Form(form): Form<BookmarkForm>,
) -> Result<Redirect, ApiError> {
    state.bookmarks().create(form.into()).await?;
    Ok(Redirect::to("/bookmarks"))
}

pub async fn update_bookmark(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Form(form): Form<BookmarkForm>,
) -> Result<Redirect, ApiError> {
    let id = validate_id("bookmark", id)?;
    state.bookmarks().update(id, form.into()).await?;
    Ok(Redirect::to(&format!("/bookmarks/view/{id}")))
}

pub async fn delete_bookmark(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Redirect, ApiError> {
    let id = validate_id("bookmark", id)?;
    state.bookmarks().delete(id).await?;
    Ok(Redirect::to("/bookmarks"))
}
