//! Production shift summary: target vs produced vs rejected per recorded
//! shift.

use super::{Materializer, ReportOutput};
use crate::entities::work_center_shift::{self, ShiftCode};
use crate::entities::work_center;
use crate::errors::ServiceError;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const KIND: &str = "shift_summary";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ShiftSummaryParams {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub work_center_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Requesting user cannot be empty"))]
    pub requested_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ShiftSummaryRow {
    pub date: NaiveDate,
    pub work_center: String,
    #[schema(value_type = String)]
    pub shift: ShiftCode,
    pub operator: Option<String>,
    pub target_qty: Decimal,
    pub produced_qty: Decimal,
    pub rejected_qty: Decimal,
    /// produced / target as a percentage; 0 when no target was set
    pub achievement_pct: f64,
    /// rejected / produced as a percentage; 0 when nothing was produced
    pub rejection_pct: f64,
}

fn pct(num: Decimal, den: Decimal) -> f64 {
    if den.is_zero() {
        return 0.0;
    }
    (num / den * Decimal::ONE_HUNDRED).to_f64().unwrap_or(0.0)
}

#[instrument(skip(mat, params), fields(requested_by = %params.requested_by))]
pub async fn run(
    mat: &Materializer,
    params: &ShiftSummaryParams,
) -> Result<ReportOutput<ShiftSummaryRow>, ServiceError> {
    params.validate()?;
    super::validate_period(params.date_from, params.date_to)?;

    let db = mat.db();

    let mut shifts = work_center_shift::Entity::find()
        .filter(work_center_shift::Column::Date.gte(params.date_from))
        .filter(work_center_shift::Column::Date.lte(params.date_to));
    if let Some(id) = params.work_center_id {
        shifts = shifts.filter(work_center_shift::Column::WorkCenterId.eq(id));
    }
    let shifts = shifts
        .order_by_asc(work_center_shift::Column::Date)
        .order_by_asc(work_center_shift::Column::WorkCenterId)
        .order_by_asc(work_center_shift::Column::Code)
        .all(db)
        .await
        .map_err(ServiceError::db_error)?;

    let centers: HashMap<Uuid, String> = work_center::Entity::find()
        .all(db)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let rows: Vec<ShiftSummaryRow> = shifts
        .iter()
        .map(|s| ShiftSummaryRow {
            date: s.date,
            work_center: centers
                .get(&s.work_center_id)
                .cloned()
                .unwrap_or_else(|| s.work_center_id.to_string()),
            shift: s.code,
            operator: s.operator.clone(),
            target_qty: s.target_qty,
            produced_qty: s.produced_qty,
            rejected_qty: s.rejected_qty,
            achievement_pct: pct(s.produced_qty, s.target_qty),
            rejection_pct: pct(s.rejected_qty, s.produced_qty),
        })
        .collect();

    let run = mat.materialize(KIND, &params.requested_by, &rows).await?;
    Ok(ReportOutput { run, rows })
}
