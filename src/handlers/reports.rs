use crate::errors::ServiceError;
use crate::reports::{
    batch_closing, dispatch_delay, grade_stock, machine_efficiency, shift_summary, stock_sheet,
    store_book,
};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/store-book", post(run_store_book))
        .route("/grade-stock", post(run_grade_stock))
        .route("/stock-sheet", post(run_stock_sheet))
        .route("/batch-closing", post(run_batch_closing))
        .route("/dispatch-delay", post(run_dispatch_delay))
        .route("/machine-efficiency", post(run_machine_efficiency))
        .route("/shift-summary", post(run_shift_summary))
        .route("/runs/:run_id", get(run_rows))
}

async fn run_store_book(
    State(state): State<AppState>,
    Json(params): Json<store_book::StoreBookParams>,
) -> Result<Json<crate::reports::ReportOutput<store_book::StoreBookRow>>, ServiceError> {
    let output = store_book::run(&state.materializer, &params).await?;
    Ok(Json(output))
}

async fn run_grade_stock(
    State(state): State<AppState>,
    Json(params): Json<grade_stock::GradeStockParams>,
) -> Result<Json<crate::reports::ReportOutput<grade_stock::GradeStockRow>>, ServiceError> {
    let output = grade_stock::run(&state.materializer, &params).await?;
    Ok(Json(output))
}

async fn run_stock_sheet(
    State(state): State<AppState>,
    Json(params): Json<stock_sheet::StockSheetParams>,
) -> Result<Json<crate::reports::ReportOutput<stock_sheet::StockSheetRow>>, ServiceError> {
    let output = stock_sheet::run(&state.materializer, &params).await?;
    Ok(Json(output))
}

async fn run_batch_closing(
    State(state): State<AppState>,
    Json(params): Json<batch_closing::BatchClosingParams>,
) -> Result<Json<crate::reports::ReportOutput<batch_closing::BatchClosingRow>>, ServiceError> {
    let output = batch_closing::run(&state.materializer, &params).await?;
    Ok(Json(output))
}

async fn run_dispatch_delay(
    State(state): State<AppState>,
    Json(params): Json<dispatch_delay::DispatchDelayParams>,
) -> Result<Json<crate::reports::ReportOutput<dispatch_delay::DispatchDelayRow>>, ServiceError> {
    let output = dispatch_delay::run(&state.materializer, &params).await?;
    Ok(Json(output))
}

async fn run_machine_efficiency(
    State(state): State<AppState>,
    Json(params): Json<machine_efficiency::MachineEfficiencyParams>,
) -> Result<Json<crate::reports::ReportOutput<machine_efficiency::MachineEfficiencyRow>>, ServiceError>
{
    let output = machine_efficiency::run(&state.materializer, &params).await?;
    Ok(Json(output))
}

async fn run_shift_summary(
    State(state): State<AppState>,
    Json(params): Json<shift_summary::ShiftSummaryParams>,
) -> Result<Json<crate::reports::ReportOutput<shift_summary::ShiftSummaryRow>>, ServiceError> {
    let output = shift_summary::run(&state.materializer, &params).await?;
    Ok(Json(output))
}

/// Rows of a previous run, exactly as materialized.
async fn run_rows(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
) -> Result<Json<Vec<serde_json::Value>>, ServiceError> {
    let rows = state
        .materializer
        .rows_for_run::<serde_json::Value>(run_id)
        .await?;
    Ok(Json(rows))
}
