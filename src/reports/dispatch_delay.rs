//! Dispatch delay: outgoing pickings past their scheduled date that are
//! neither completed nor acknowledged.

use super::{partner_name_map, Materializer, ReportOutput};
use crate::entities::{stock_move, stock_picking};
use crate::errors::ServiceError;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const KIND: &str = "dispatch_delay";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct DispatchDelayParams {
    /// Pickings scheduled strictly before this date count as delayed
    pub as_of: NaiveDate,
    #[validate(length(min = 1, message = "Requesting user cannot be empty"))]
    pub requested_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DispatchDelayRow {
    pub picking_id: Uuid,
    pub packing_slip_no: String,
    pub customer: Option<String>,
    pub exp_dispatch_date: Option<NaiveDate>,
    pub dispatch_date: Option<NaiveDate>,
    pub remark: Option<String>,
    pub total_qty: Decimal,
}

#[instrument(skip(mat, params), fields(requested_by = %params.requested_by))]
pub async fn run(
    mat: &Materializer,
    params: &DispatchDelayParams,
) -> Result<ReportOutput<DispatchDelayRow>, ServiceError> {
    params.validate()?;

    let db = mat.db();
    let cutoff = params.as_of.and_time(NaiveTime::MIN).and_utc();

    let pickings = stock_picking::Entity::find()
        .filter(stock_picking::Column::Kind.eq(stock_picking::PickingKind::Outgoing))
        .filter(stock_picking::Column::State.eq(stock_picking::PickingState::Draft))
        .filter(stock_picking::Column::DelayAcknowledged.eq(false))
        .filter(stock_picking::Column::ScheduledDate.is_not_null())
        .filter(stock_picking::Column::ScheduledDate.lt(cutoff))
        .order_by_asc(stock_picking::Column::ScheduledDate)
        .order_by_asc(stock_picking::Column::Id)
        .all(db)
        .await
        .map_err(ServiceError::db_error)?;

    let picking_ids: Vec<Uuid> = pickings.iter().map(|p| p.id).collect();
    let mut totals: HashMap<Uuid, Decimal> = HashMap::new();
    if !picking_ids.is_empty() {
        let moves = stock_move::Entity::find()
            .filter(stock_move::Column::PickingId.is_in(picking_ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        for mv in moves {
            if let Some(picking_id) = mv.picking_id {
                *totals.entry(picking_id).or_default() += mv.quantity;
            }
        }
    }

    let partners = partner_name_map(db).await?;

    let rows: Vec<DispatchDelayRow> = pickings
        .iter()
        .map(|p| DispatchDelayRow {
            picking_id: p.id,
            packing_slip_no: p.name.clone(),
            customer: p.partner_id.and_then(|id| partners.get(&id).cloned()),
            exp_dispatch_date: p.scheduled_date.map(|d| d.date_naive()),
            dispatch_date: p.date_done.map(|d| d.date_naive()),
            remark: p.remarks.clone(),
            total_qty: totals.get(&p.id).copied().unwrap_or_default(),
        })
        .collect();

    let run = mat.materialize(KIND, &params.requested_by, &rows).await?;
    Ok(ReportOutput { run, rows })
}
