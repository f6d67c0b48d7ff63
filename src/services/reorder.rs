//! Reorder planning: consumption history, on-hand stock and observed
//! purchase lead times folded into a suggested replenishment quantity per
//! raw material.

use crate::entities::{product, stock_picking};
use crate::errors::ServiceError;
use crate::ledger::{self, MoveQuery};
use crate::reports::{picking_map, Materializer, ReportOutput};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const KIND: &str = "reorder";

const DAYS_PER_MONTH: f64 = 30.0;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReorderParams {
    /// Length of the consumption window, in months
    #[validate(range(min = 1, max = 24, message = "Analysis period must be 1-24 months"))]
    pub months: u32,
    /// Safety margin applied on top of the reorder point, in percent
    #[validate(range(min = 0.0, max = 100.0, message = "Safety margin must be 0-100%"))]
    pub safety_factor: f64,
    pub category: Option<String>,
    /// Products consuming less than this per month are skipped
    #[serde(default)]
    pub min_avg_threshold: f64,
    pub end_date: NaiveDate,
    #[validate(length(min = 1, message = "Requesting user cannot be empty"))]
    pub requested_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReorderRow {
    pub product_id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub category: Option<String>,
    /// Total consumption over the window
    pub consumed_qty: f64,
    pub avg_monthly_qty: f64,
    pub on_hand_qty: f64,
    pub lead_time_days: f64,
    pub reorder_point: f64,
    pub required_qty: f64,
    /// Required quantity rounded up to whole units
    pub suggested_qty: f64,
}

#[derive(Clone)]
pub struct ReorderService {
    mat: Materializer,
    default_lead_time_days: f64,
}

impl ReorderService {
    pub fn new(mat: Materializer, default_lead_time_days: f64) -> Self {
        Self {
            mat,
            default_lead_time_days,
        }
    }

    /// Mean days from creation to completion of the incoming pickings
    /// that carried this product inside the window. Falls back to the
    /// product override, then the company default.
    async fn purchase_lead_time(
        &self,
        product: &product::Model,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Result<f64, ServiceError> {
        let db = self.mat.db();
        let moves = MoveQuery::between(window_start, window_end)
            .product(Some(product.id))
            .fetch(db)
            .await?;
        let pickings = picking_map(db, moves.iter().filter_map(|m| m.picking_id)).await?;

        let mut lead_times: Vec<f64> = Vec::new();
        for picking in pickings.values() {
            if picking.kind != stock_picking::PickingKind::Incoming {
                continue;
            }
            let Some(done) = picking.date_done else {
                continue;
            };
            let days = done
                .signed_duration_since(picking.created_at)
                .num_seconds() as f64
                / 86_400.0;
            if days >= 0.0 {
                lead_times.push(days);
            }
        }

        if lead_times.is_empty() {
            Ok(product
                .lead_time_days
                .unwrap_or(self.default_lead_time_days))
        } else {
            Ok(lead_times.iter().sum::<f64>() / lead_times.len() as f64)
        }
    }

    /// Computes and materializes the reorder plan.
    #[instrument(skip(self, params), fields(requested_by = %params.requested_by))]
    pub async fn compute(
        &self,
        params: &ReorderParams,
    ) -> Result<ReportOutput<ReorderRow>, ServiceError> {
        params.validate()?;

        let db = self.mat.db();
        let window_start = params.end_date - chrono::Duration::days(
            i64::from(params.months) * DAYS_PER_MONTH as i64,
        );
        let usages = ledger::load_location_usages(db).await?;

        let products = crate::reports::product_map(db).await?;
        let mut candidates: Vec<&product::Model> = products
            .values()
            .filter(|p| p.purchase_ok)
            .filter(|p| match &params.category {
                Some(category) => p
                    .category
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(category)),
                None => true,
            })
            .collect();
        candidates.sort_by(|a, b| a.code.cmp(&b.code));

        let mut rows: Vec<ReorderRow> = Vec::new();
        for product in candidates {
            let window_moves = MoveQuery::between(window_start, params.end_date)
                .product(Some(product.id))
                .fetch(db)
                .await?;
            let records = ledger::to_records(&window_moves, &usages)?;
            let consumed: f64 = records
                .iter()
                .map(|r| {
                    ledger::Flow::classify(r, None)
                        .issued
                        .to_f64()
                        .unwrap_or(0.0)
                })
                .sum();
            let avg_monthly = consumed / f64::from(params.months);
            if avg_monthly < params.min_avg_threshold {
                continue;
            }

            let all_moves = MoveQuery::as_on(params.end_date)
                .product(Some(product.id))
                .fetch(db)
                .await?;
            let all_records = ledger::to_records(&all_moves, &usages)?;
            let on_hand = ledger::opening_balance(&all_records, None)
                .to_f64()
                .unwrap_or(0.0);

            let lead_time = self
                .purchase_lead_time(product, window_start, params.end_date)
                .await?;

            let daily = avg_monthly / DAYS_PER_MONTH;
            let reorder_point = daily * lead_time * (1.0 + params.safety_factor / 100.0);
            let required = (reorder_point - on_hand).max(0.0);
            let suggested = required.ceil();

            rows.push(ReorderRow {
                product_id: product.id,
                product_code: product.code.clone(),
                product_name: product.name.clone(),
                category: product.category.clone(),
                consumed_qty: consumed,
                avg_monthly_qty: avg_monthly,
                on_hand_qty: on_hand,
                lead_time_days: lead_time,
                reorder_point,
                required_qty: required,
                suggested_qty: suggested,
            });
        }

        info!(products = rows.len(), "reorder plan computed");

        let run = self.mat.materialize(KIND, &params.requested_by, &rows).await?;
        Ok(ReportOutput { run, rows })
    }
}
