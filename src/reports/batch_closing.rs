//! Batch closing: per production lot, the work-order quantity against
//! what was actually produced, dispatched and scrapped.

use super::{product_map, Materializer, ReportOutput};
use crate::entities::stock_location::LocationUsage;
use crate::entities::{production_order, stock_lot, stock_move};
use crate::errors::ServiceError;
use crate::ledger::{self, MoveQuery};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const KIND: &str = "batch_closing";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BatchClosingParams {
    /// Work-order start-date window
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub product_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Requesting user cannot be empty"))]
    pub requested_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BatchClosingRow {
    pub lot: String,
    pub wo_no: String,
    pub wo_date: NaiveDate,
    /// `YYYY-MM` label for monthly grouping
    pub month: String,
    pub product_code: Option<String>,
    pub product_name: Option<String>,
    pub wo_qty: Decimal,
    pub production_qty: Decimal,
    pub dispatch_qty: Decimal,
    pub scrap_qty: Decimal,
}

#[instrument(skip(mat, params), fields(requested_by = %params.requested_by))]
pub async fn run(
    mat: &Materializer,
    params: &BatchClosingParams,
) -> Result<ReportOutput<BatchClosingRow>, ServiceError> {
    params.validate()?;
    super::validate_period(params.date_from, params.date_to)?;

    let db = mat.db();
    let usages = ledger::load_location_usages(db).await?;
    let products = product_map(db).await?;

    let mut orders = production_order::Entity::find()
        .filter(production_order::Column::State.eq(production_order::ProductionState::Done))
        .filter(
            production_order::Column::DateStart
                .gte(params.date_from.and_hms_opt(0, 0, 0).map(|t| t.and_utc())),
        )
        .filter(
            production_order::Column::DateStart
                .lte(params.date_to.and_hms_opt(23, 59, 59).map(|t| t.and_utc())),
        );
    if let Some(product_id) = params.product_id {
        orders = orders.filter(production_order::Column::ProductId.eq(product_id));
    }
    let orders = orders
        .order_by_desc(production_order::Column::DateStart)
        .all(db)
        .await
        .map_err(ServiceError::db_error)?;

    if orders.is_empty() {
        let run = mat.materialize(KIND, &params.requested_by, &[] as &[BatchClosingRow]).await?;
        return Ok(ReportOutput { run, rows: vec![] });
    }

    // Finalized output moves of those orders, keyed (order, lot)
    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let production_moves = stock_move::Entity::find()
        .filter(stock_move::Column::State.eq(stock_move::MoveState::Done))
        .filter(stock_move::Column::ProductionOrderId.is_in(order_ids))
        .filter(stock_move::Column::LotId.is_not_null())
        .all(db)
        .await
        .map_err(ServiceError::db_error)?;

    let mut produced: HashMap<(Uuid, Uuid), Decimal> = HashMap::new();
    for mv in &production_moves {
        let (Some(order_id), Some(lot_id)) = (mv.production_order_id, mv.lot_id) else {
            continue;
        };
        let into_internal = usages
            .get(&mv.dest_location_id)
            .is_some_and(|u| u.is_internal());
        if into_internal {
            *produced.entry((order_id, lot_id)).or_default() += mv.quantity;
        }
    }

    // Downstream traffic of every produced lot
    let mut dispatched: HashMap<Uuid, Decimal> = HashMap::new();
    let mut scrapped: HashMap<Uuid, Decimal> = HashMap::new();
    for lot_id in produced.keys().map(|(_, lot)| *lot) {
        if dispatched.contains_key(&lot_id) || scrapped.contains_key(&lot_id) {
            continue;
        }
        let lot_moves = MoveQuery::default().lot(Some(lot_id)).fetch(db).await?;
        let mut dispatch = Decimal::ZERO;
        let mut scrap = Decimal::ZERO;
        for mv in &lot_moves {
            match usages.get(&mv.dest_location_id) {
                Some(LocationUsage::Customer) => dispatch += mv.quantity,
                Some(LocationUsage::Scrap) => scrap += mv.quantity,
                _ => {}
            }
        }
        dispatched.insert(lot_id, dispatch);
        scrapped.insert(lot_id, scrap);
    }

    let lots = stock_lot::Entity::find()
        .all(db)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|l| (l.id, l))
        .collect::<HashMap<Uuid, stock_lot::Model>>();

    let mut rows = Vec::new();
    for order in &orders {
        let product = products.get(&order.product_id);
        let wo_date = order.date_start.date_naive();

        let mut order_lots: Vec<Uuid> = produced
            .keys()
            .filter(|(oid, _)| *oid == order.id)
            .map(|(_, lot)| *lot)
            .collect();
        order_lots.sort();

        for lot_id in order_lots {
            let lot_name = lots
                .get(&lot_id)
                .map(|l| l.name.clone())
                .unwrap_or_else(|| lot_id.to_string());
            rows.push(BatchClosingRow {
                lot: lot_name,
                wo_no: order.name.clone(),
                wo_date,
                month: wo_date.format("%Y-%m").to_string(),
                product_code: product.map(|p| p.code.clone()),
                product_name: product.map(|p| p.name.clone()),
                wo_qty: order.quantity,
                production_qty: produced
                    .get(&(order.id, lot_id))
                    .copied()
                    .unwrap_or_default(),
                dispatch_qty: dispatched.get(&lot_id).copied().unwrap_or_default(),
                scrap_qty: scrapped.get(&lot_id).copied().unwrap_or_default(),
            });
        }
    }

    let run = mat.materialize(KIND, &params.requested_by, &rows).await?;
    Ok(ReportOutput { run, rows })
}
