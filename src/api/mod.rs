use axum::{
    Router,
    http::{Method, header},
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod bookmarks;
mod error;
mod export;
mod external;
mod keys;
mod observability;
pub mod pager;
pub mod params;
mod tags;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use crate::services::{AuthService, BookmarkService};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn bookmarks(&self) -> &Arc<dyn BookmarkService> {
        &self.shared.bookmark_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let protected_routes = create_protected_router(state.clone());

    // The bookmarklet posts from arbitrary pages, so the API is open to any origin
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let api_router = Router::new()
        .route("/bookmarks", post(external::create_bookmark))
        .route("/export", get(external::export_bookmarks))
        .layer(cors_layer);

    Router::new()
        .merge(protected_routes)
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/health", get(observability::health))
        .nest("/api", api_router)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(bookmarks::index))
        .route("/bookmarks", get(bookmarks::list_bookmarks))
        .route("/bookmarks/new", post(bookmarks::create_bookmark))
        .route("/bookmarks/view/{id}", get(bookmarks::view_bookmark))
        .route(
            "/bookmarks/edit/{id}",
            get(bookmarks::edit_bookmark_page).post(bookmarks::update_bookmark),
        )
        .route("/bookmarks/delete/{id}", post(bookmarks::delete_bookmark))
        .route("/tags", get(tags::list_tags))
        .route("/keys", get(keys::list_keys))
        .route("/keys/new", post(keys::create_key))
        .route("/keys/delete/{id}", post(keys::delete_key))
        .route("/export", get(export::export_page))
        .route("/logout", post(auth::logout))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn(auth::verify_csrf))
        .route_layer(middleware::from_fn_with_state(state, auth::require_session))
}
