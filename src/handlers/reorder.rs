use crate::errors::ServiceError;
use crate::reports::ReportOutput;
use crate::services::reorder::{ReorderParams, ReorderRow};
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(compute))
}

async fn compute(
    State(state): State<AppState>,
    Json(params): Json<ReorderParams>,
) -> Result<Json<ReportOutput<ReorderRow>>, ServiceError> {
    let output = state.reorder_service.compute(&params).await?;
    Ok(Json(output))
}
