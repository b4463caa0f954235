//! API routes for the extraction server

pub mod execute;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Json, Router,
};

use crate::server::{auth, state::AppState};

/// Room for multipart boundaries and the action field on top of the file
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build all authenticated API routes
pub fn api_routes(state: AppState, max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route(
            "/execute",
            post(execute::execute)
                .layer(DefaultBodyLimit::max(max_upload_size + MULTIPART_OVERHEAD)),
        )
        .route_layer(middleware::from_fn_with_state(state, auth::require_api_key))
}

/// Liveness message for authenticated clients
async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "API is running" }))
}
