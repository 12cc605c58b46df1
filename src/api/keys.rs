use axum::{
    Extension, Json,
    extract::{Path, State},
    response::Redirect,
};
use axum_extra::extract::Form;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::auth::CurrentSession;
use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, KeysView};

#[derive(Debug, Deserialize)]
pub struct NewKeyForm {
    pub name: String,
}

pub async fn list_keys(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Json<ApiResponse<KeysView>>, ApiError> {
    let keys = state.auth().list_api_keys().await?;

    Ok(Json(ApiResponse::success(KeysView {
        keys,
        csrf_token: current.info.csrf_token,
    })))
}

pub async fn create_key(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentSession>,
    Form(form): Form<NewKeyForm>,
) -> Result<Redirect, ApiError> {
    state.auth().create_api_key(form.name.trim()).await?;
    info!(user_id = current.info.user_id, name = %form.name.trim(), "API key created");
    Ok(Redirect::to("/keys"))
}

pub async fn delete_key(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<i32>,
) -> Result<Redirect, ApiError> {
    let id = validate_id("key", id)?;
    state.auth().delete_api_key(id).await?;
    info!(user_id = current.info.user_id, key_id = id, "API key deleted");
    Ok(Redirect::to("/keys"))
}
