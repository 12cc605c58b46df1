use axum::{Extension, Json, extract::State};
use std::sync::Arc;

use super::auth::CurrentSession;
use super::{ApiError, ApiResponse, AppState, TagsView};

pub async fn list_tags(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Json<ApiResponse<TagsView>>, ApiError> {
    let tags = state.bookmarks().tags().await?;

    Ok(Json(ApiResponse::success(TagsView {
        tags,
        csrf_token: current.info.csrf_token,
    })))
}
