use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentSession;
use super::{ApiError, ApiResponse, AppState, ExportView};

pub const EXPORT_PROMPT: &str =
    "Exporting can take a while with many bookmarks. Open /export?really=yes to continue.";

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub really: Option<String>,
}

pub async fn export_page(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentSession>,
    Query(query): Query<ExportQuery>,
) -> Result<Json<ApiResponse<ExportView>>, ApiError> {
    let data = if query.really.as_deref() == Some("yes") {
        let bookmarks = state.bookmarks().export().await?;
        serde_json::to_string_pretty(&bookmarks)
            .map_err(|e| ApiError::internal(format!("Failed to serialize export: {e}")))?
    } else {
        EXPORT_PROMPT.to_string()
    };

    Ok(Json(ApiResponse::success(ExportView {
        data,
        csrf_token: current.info.csrf_token,
    })))
}
