use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::pager::PagerLinks;
use super::params::SearchParams;
use crate::db::ApiKey;
use crate::models::bookmark::{Bookmark, TagCount};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// `{code, message}` reply of the bookmarklet API; `code` mirrors the HTTP status.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub code: u16,
    pub message: String,
}

impl ResultEnvelope {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn ok() -> Self {
        Self::new(StatusCode::OK, "OK")
    }
}

impl IntoResponse for ResultEnvelope {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct IndexView {
    pub bookmarks: Vec<Bookmark>,
    pub pager: PagerLinks,
    pub search_params: SearchParams,
    pub num_bookmarks: u64,
    pub csrf_token: String,
}

#[derive(Debug, Serialize)]
pub struct BookmarkView {
    pub bookmark: Bookmark,
    pub search_params: SearchParams,
    pub csrf_token: String,
}

#[derive(Debug, Serialize)]
pub struct TagsView {
    pub tags: Vec<TagCount>,
    pub csrf_token: String,
}

#[derive(Debug, Serialize)]
pub struct KeysView {
    pub keys: Vec<ApiKey>,
    pub csrf_token: String,
}

#[derive(Debug, Serialize)]
pub struct ExportView {
    /// Exported JSON, or a prompt until the export is confirmed
    pub data: String,
    pub csrf_token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginView {
    pub message: Option<String>,
    pub redirect_to: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_seconds: u64,
}
