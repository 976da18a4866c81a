use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{any, get, post};
use axum::{middleware, Router};
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::auth_middleware::auth_middleware;
use crate::config::Config;

pub mod auth_middleware;
pub mod config;
pub mod dxl;
pub mod error;
pub mod responses;
pub mod upload;

const DXL_BODY_LIMIT: usize = 8 * 1024 * 1024;
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub connection: DatabaseConnection,
    pub config: Arc<Config>,
}

pub fn router(state: AppState) -> Router {
    let file_limit = state.config.limits.largest_bytes() as usize + MULTIPART_OVERHEAD;

    // Routes that need a known caller in `x-user-id`
    let authenticated: Router<AppState> = Router::new()
        .route(
            "/file",
            post(upload::file::upload_file).layer(DefaultBodyLimit::max(file_limit)),
        )
        .route("/jobs/:id", get(upload::jobs::get_job))
        .layer(middleware::from_fn_with_state(
            state.to_owned(),
            auth_middleware,
        ));

    let upload_routes: Router<AppState> = Router::new()
        .route(
            "/extract-metadata",
            post(upload::metadata::extract_metadata).layer(DefaultBodyLimit::max(file_limit)),
        )
        .route("/publish", post(upload::publish::publish))
        .route("/save-job", post(upload::jobs::save_job))
        .merge(authenticated);

    Router::new()
        .route(
            "/api/dxl/v3",
            any(dxl::dispatch).layer(DefaultBodyLimit::max(DXL_BODY_LIMIT)),
        )
        .nest("/api/upload", upload_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.upload_root))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
