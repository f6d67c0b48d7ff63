//! Machine efficiency: downtime minutes split across the reason
//! catalogue per work center, against the minutes the recorded shifts
//! made available.

use super::{Materializer, ReportOutput};
use crate::entities::downtime_entry::{self, DowntimeReason};
use crate::entities::{work_center, work_center_shift};
use crate::errors::ServiceError;
use chrono::{NaiveDate, NaiveTime};
use sea_orm::{ColumnTrait, EntityTrait, Iterable, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const KIND: &str = "machine_efficiency";

const SHIFT_MINUTES: f64 = 480.0;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MachineEfficiencyParams {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub work_center_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Requesting user cannot be empty"))]
    pub requested_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MachineEfficiencyRow {
    pub work_center_id: Uuid,
    pub work_center: String,
    /// Downtime minutes per catalogue reason, zero-filled
    pub downtime_by_reason: BTreeMap<String, f64>,
    pub total_downtime_minutes: f64,
    pub working_minutes: f64,
    pub production_minutes: f64,
    /// production / working, as a percentage; 0 when no shift was recorded
    pub efficiency_pct: f64,
}

fn zeroed_reasons() -> BTreeMap<String, f64> {
    DowntimeReason::iter()
        .map(|r| (r.to_string(), 0.0))
        .collect()
}

#[instrument(skip(mat, params), fields(requested_by = %params.requested_by))]
pub async fn run(
    mat: &Materializer,
    params: &MachineEfficiencyParams,
) -> Result<ReportOutput<MachineEfficiencyRow>, ServiceError> {
    params.validate()?;
    super::validate_period(params.date_from, params.date_to)?;

    let db = mat.db();
    let window_start = params.date_from.and_time(NaiveTime::MIN).and_utc();
    let window_end = params
        .date_to
        .and_hms_opt(23, 59, 59)
        .map(|t| t.and_utc())
        .unwrap_or(window_start);

    let mut centers = work_center::Entity::find();
    if let Some(id) = params.work_center_id {
        centers = centers.filter(work_center::Column::Id.eq(id));
    }
    let centers = centers.all(db).await.map_err(ServiceError::db_error)?;

    let mut downtimes = downtime_entry::Entity::find()
        .filter(downtime_entry::Column::StartedAt.gte(window_start))
        .filter(downtime_entry::Column::StartedAt.lte(window_end));
    if let Some(id) = params.work_center_id {
        downtimes = downtimes.filter(downtime_entry::Column::WorkCenterId.eq(id));
    }
    let downtimes = downtimes.all(db).await.map_err(ServiceError::db_error)?;

    let mut shifts = work_center_shift::Entity::find()
        .filter(work_center_shift::Column::Date.gte(params.date_from))
        .filter(work_center_shift::Column::Date.lte(params.date_to));
    if let Some(id) = params.work_center_id {
        shifts = shifts.filter(work_center_shift::Column::WorkCenterId.eq(id));
    }
    let shifts = shifts.all(db).await.map_err(ServiceError::db_error)?;

    let mut shift_counts: HashMap<Uuid, usize> = HashMap::new();
    for shift in &shifts {
        *shift_counts.entry(shift.work_center_id).or_default() += 1;
    }

    let mut by_center: HashMap<Uuid, BTreeMap<String, f64>> = HashMap::new();
    for entry in &downtimes {
        let reasons = by_center
            .entry(entry.work_center_id)
            .or_insert_with(zeroed_reasons);
        *reasons.entry(entry.reason.to_string()).or_insert(0.0) += entry.minutes();
    }

    let mut rows: Vec<MachineEfficiencyRow> = centers
        .iter()
        .map(|center| {
            let reasons = by_center
                .get(&center.id)
                .cloned()
                .unwrap_or_else(zeroed_reasons);
            let total_downtime: f64 = reasons.values().sum();
            let working = shift_counts.get(&center.id).copied().unwrap_or(0) as f64 * SHIFT_MINUTES;
            let production = (working - total_downtime).max(0.0);
            let efficiency = if working > 0.0 {
                production / working * 100.0
            } else {
                0.0
            };
            MachineEfficiencyRow {
                work_center_id: center.id,
                work_center: center.name.clone(),
                downtime_by_reason: reasons,
                total_downtime_minutes: total_downtime,
                working_minutes: working,
                production_minutes: production,
                efficiency_pct: efficiency,
            }
        })
        .collect();
    rows.sort_by(|a, b| a.work_center.cmp(&b.work_center));

    let run = mat.materialize(KIND, &params.requested_by, &rows).await?;
    Ok(ReportOutput { run, rows })
}
