//! Bookmarklet and backup endpoints authenticated by API key instead of the
//! session cookie.

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::auth::{authorize_api_key, extract_api_key};
use super::{ApiError, AppState, ResultEnvelope};
use crate::models::bookmark::BookmarkInput;

#[derive(Debug, Deserialize)]
pub struct ApiBookmarkRequest {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub auth: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiKeyQuery {
    #[serde(default)]
    pub auth: Option<String>,
}

/// POST /api/bookmarks
pub async fn create_bookmark(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ApiKeyQuery>,
    payload: Result<Json<ApiBookmarkRequest>, JsonRejection>,
) -> Response {
    match create_bookmark_inner(&state, &headers, query, payload).await {
        Ok(envelope) => envelope.into_response(),
        Err(e) => e.into_envelope(),
    }
}

async fn create_bookmark_inner(
    state: &AppState,
    headers: &HeaderMap,
    query: ApiKeyQuery,
    payload: Result<Json<ApiBookmarkRequest>, JsonRejection>,
) -> Result<ResultEnvelope, ApiError> {
    let allow_fallback = state.config().server.allow_api_key_in_query;

    // Header or query key is checked before the body is looked at
    let early_key = match extract_api_key(headers, query.auth.as_deref(), allow_fallback) {
        Some(key) => Some(authorize_api_key(state, Some(key)).await?),
        None => None,
    };

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) if early_key.is_some() => {
            return Err(ApiError::validation(rejection.body_text()));
        }
        Err(_) => return Err(ApiError::validation("Missing API key")),
    };

    let key_name = match early_key {
        Some(name) => name,
        None => {
            let key = extract_api_key(headers, request.auth.as_deref(), allow_fallback);
            authorize_api_key(state, key).await?
        }
    };

    let id = state
        .bookmarks()
        .create(BookmarkInput {
            name: request.name,
            url: request.url,
            description: request.description,
            tags: request.tags,
        })
        .await?;

    info!(bookmark_id = id, key = %key_name, "Bookmark created via API");
    Ok(ResultEnvelope::ok())
}

/// GET /api/export. Only the `Authorization` header is accepted here.
pub async fn export_bookmarks(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let key = extract_api_key(&headers, None, false);

    let result = async {
        authorize_api_key(&state, key).await?;
        Ok::<_, ApiError>(state.bookmarks().export().await?)
    }
    .await;

    match result {
        Ok(bookmarks) => Json(bookmarks).into_response(),
        Err(e) => e.into_envelope(),
    }
}
