use crate::commands::workcenter::{RecordDowntimeCommand, RecordShiftCommand};
use crate::commands::Command;
use crate::entities::{downtime_entry, work_center_shift};
use crate::errors::ServiceError;
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/downtime", post(record_downtime))
        .route("/shifts", post(record_shift))
}

async fn record_downtime(
    State(state): State<AppState>,
    Json(command): Json<RecordDowntimeCommand>,
) -> Result<Json<downtime_entry::Model>, ServiceError> {
    let entry = command.execute(&state.commands).await?;
    Ok(Json(entry))
}

async fn record_shift(
    State(state): State<AppState>,
    Json(command): Json<RecordShiftCommand>,
) -> Result<Json<work_center_shift::Model>, ServiceError> {
    let shift = command.execute(&state.commands).await?;
    Ok(Json(shift))
}
