use crate::commands::packing::CreatePackingMemoCommand;
use crate::commands::Command;
use crate::entities::packing_memo;
use crate::errors::ServiceError;
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_memo))
}

async fn create_memo(
    State(state): State<AppState>,
    Json(command): Json<CreatePackingMemoCommand>,
) -> Result<Json<packing_memo::Model>, ServiceError> {
    let memo = command.execute(&state.commands).await?;
    Ok(Json(memo))
}
