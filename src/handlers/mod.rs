use crate::AppState;
use axum::{routing::get, Json, Router};
use serde_json::json;

pub mod packing;
pub mod reorder;
pub mod reports;
pub mod stock;
pub mod workcenter;

/// Assembles the full API router.
pub fn app_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/reports", reports::router())
        .nest("/stock", stock::router())
        .nest("/packing-memos", packing::router())
        .nest("/work-centers", workcenter::router())
        .nest("/reorder", reorder::router())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
