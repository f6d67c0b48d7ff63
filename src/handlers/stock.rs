use crate::commands::stock::{AcknowledgeDelayCommand, FinalizePickingCommand};
use crate::commands::Command;
use crate::entities::{stock_move, stock_picking};
use crate::errors::ServiceError;
use crate::services::stock::MoveFilter;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/moves", get(list_moves))
        .route("/lots/:lot_id/available", get(lot_available))
        .route("/pickings/:picking_id/finalize", post(finalize_picking))
        .route(
            "/pickings/:picking_id/acknowledge-delay",
            post(acknowledge_delay),
        )
}

async fn list_moves(
    State(state): State<AppState>,
    Query(filter): Query<MoveFilter>,
) -> Result<Json<Vec<stock_move::Model>>, ServiceError> {
    let moves = state.stock_service.list_moves(&filter).await?;
    Ok(Json(moves))
}

#[derive(Debug, Serialize, ToSchema)]
struct LotAvailability {
    lot_id: Uuid,
    available_qty: Decimal,
}

async fn lot_available(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> Result<Json<LotAvailability>, ServiceError> {
    let available_qty = state.stock_service.lot_available(lot_id).await?;
    Ok(Json(LotAvailability {
        lot_id,
        available_qty,
    }))
}

async fn finalize_picking(
    State(state): State<AppState>,
    Path(picking_id): Path<Uuid>,
) -> Result<Json<stock_picking::Model>, ServiceError> {
    let command = FinalizePickingCommand { picking_id };
    let picking = command.execute(&state.commands).await?;
    Ok(Json(picking))
}

#[derive(Debug, Deserialize, ToSchema)]
struct AcknowledgeDelayRequest {
    reason: String,
}

async fn acknowledge_delay(
    State(state): State<AppState>,
    Path(picking_id): Path<Uuid>,
    Json(body): Json<AcknowledgeDelayRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let command = AcknowledgeDelayCommand {
        picking_id,
        reason: body.reason,
    };
    command.execute(&state.commands).await?;
    Ok(Json(serde_json::json!({ "acknowledged": true })))
}
