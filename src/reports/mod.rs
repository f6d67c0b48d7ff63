//! Report wizards and the run materializer.
//!
//! Every wizard computes its rows synchronously, persists them to the
//! `report_rows` scratch table tagged with a fresh run id, and returns the
//! rows alongside the run summary. Readers filter by run id, so concurrent
//! runs never observe each other's output. Each run also purges rows of
//! its own report kind that are older than the configured retention.

pub mod batch_closing;
pub mod dispatch_delay;
pub mod grade_stock;
pub mod machine_efficiency;
pub mod shift_summary;
pub mod stock_sheet;
pub mod store_book;

use crate::entities::{job_party, partner, product, report_row, stock_location, stock_picking, stock_lot};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Summary of one materialized wizard run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub report: String,
    pub requested_by: String,
    pub generated_at: DateTime<Utc>,
    pub rows: usize,
}

/// A wizard's result: the run summary plus the typed rows of this run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutput<T> {
    pub run: RunSummary,
    pub rows: Vec<T>,
}

/// Rejects an inverted reporting period.
pub fn validate_period(date_from: NaiveDate, date_to: NaiveDate) -> Result<(), ServiceError> {
    if date_to < date_from {
        return Err(ServiceError::ValidationError(format!(
            "end date {date_to} is before start date {date_from}"
        )));
    }
    Ok(())
}

/// Writes wizard output to the scratch table, one run at a time.
#[derive(Clone)]
pub struct Materializer {
    db: Arc<DatabaseConnection>,
    events: EventSender,
    retention: chrono::Duration,
}

impl Materializer {
    pub fn new(db: Arc<DatabaseConnection>, events: EventSender, retention_hours: i64) -> Self {
        Self {
            db,
            events,
            retention: chrono::Duration::hours(retention_hours.max(0)),
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Purges expired rows of `report`, then inserts `rows` under a fresh
    /// run id and announces the run.
    #[instrument(skip(self, rows), fields(report = report, count = rows.len()))]
    pub async fn materialize<T: Serialize>(
        &self,
        report: &str,
        requested_by: &str,
        rows: &[T],
    ) -> Result<RunSummary, ServiceError> {
        let run_id = Uuid::new_v4();
        let now = Utc::now();

        report_row::Entity::delete_many()
            .filter(report_row::Column::Report.eq(report))
            .filter(report_row::Column::CreatedAt.lt(now - self.retention))
            .exec(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        for (i, row) in rows.iter().enumerate() {
            let payload = serde_json::to_value(row).map_err(|e| {
                ServiceError::InternalError(format!("failed to serialize report row: {e}"))
            })?;
            let model = report_row::ActiveModel {
                id: Set(Uuid::new_v4()),
                run_id: Set(run_id),
                report: Set(report.to_string()),
                line_no: Set(i as i32),
                payload: Set(payload),
                created_at: Set(now),
            };
            model
                .insert(&*self.db)
                .await
                .map_err(ServiceError::db_error)?;
        }

        self.events
            .send(Event::ReportGenerated {
                report: report.to_string(),
                run_id,
                rows: rows.len(),
                generated_at: now,
            })
            .await
            .map_err(ServiceError::EventError)?;

        info!(report = %report, run_id = %run_id, rows = rows.len(), "report run materialized");

        Ok(RunSummary {
            run_id,
            report: report.to_string(),
            requested_by: requested_by.to_string(),
            generated_at: now,
            rows: rows.len(),
        })
    }

    /// Reads back one run's rows, in emitted order.
    pub async fn rows_for_run<T: DeserializeOwned>(
        &self,
        run_id: Uuid,
    ) -> Result<Vec<T>, ServiceError> {
        let stored = report_row::Entity::find()
            .filter(report_row::Column::RunId.eq(run_id))
            .order_by_asc(report_row::Column::LineNo)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        stored
            .into_iter()
            .map(|row| {
                serde_json::from_value(row.payload).map_err(|e| {
                    ServiceError::InternalError(format!("failed to decode report row: {e}"))
                })
            })
            .collect()
    }
}

// Shared lookup loaders. Whole-table maps are acceptable at the data
// volumes these reports serve.

pub(crate) async fn product_map(
    db: &DatabaseConnection,
) -> Result<HashMap<Uuid, product::Model>, ServiceError> {
    let rows = product::Entity::find()
        .all(db)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(rows.into_iter().map(|p| (p.id, p)).collect())
}

pub(crate) async fn picking_map(
    db: &DatabaseConnection,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, stock_picking::Model>, ServiceError> {
    let ids: Vec<Uuid> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = stock_picking::Entity::find()
        .filter(stock_picking::Column::Id.is_in(ids))
        .all(db)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(rows.into_iter().map(|p| (p.id, p)).collect())
}

pub(crate) async fn partner_name_map(
    db: &DatabaseConnection,
) -> Result<HashMap<Uuid, String>, ServiceError> {
    let rows = partner::Entity::find()
        .all(db)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(rows.into_iter().map(|p| (p.id, p.name)).collect())
}

pub(crate) async fn party_name_map(
    db: &DatabaseConnection,
) -> Result<HashMap<Uuid, String>, ServiceError> {
    let rows = job_party::Entity::find()
        .all(db)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(rows.into_iter().map(|p| (p.id, p.name)).collect())
}

pub(crate) async fn location_name_map(
    db: &DatabaseConnection,
) -> Result<HashMap<Uuid, String>, ServiceError> {
    let rows = stock_location::Entity::find()
        .all(db)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(rows.into_iter().map(|l| (l.id, l.name)).collect())
}

pub(crate) async fn lot_map(
    db: &DatabaseConnection,
) -> Result<HashMap<Uuid, stock_lot::Model>, ServiceError> {
    let rows = stock_lot::Entity::find()
        .all(db)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(rows.into_iter().map(|l| (l.id, l)).collect())
}
