//! RM store book: the per-movement stock ledger with an opening-balance
//! row, optionally scoped to a single internal location.

use super::{partner_name_map, picking_map, product_map, Materializer, ReportOutput, RunSummary};
use crate::entities::{stock_move, stock_picking};
use crate::errors::ServiceError;
use crate::ledger::{self, MoveQuery};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const KIND: &str = "store_book";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct StoreBookParams {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub product_id: Option<Uuid>,
    pub party_id: Option<Uuid>,
    /// Restricts the ledger to one internal location
    pub location_id: Option<Uuid>,
    pub raw_type: Option<String>,
    #[validate(length(min = 1, message = "Requesting user cannot be empty"))]
    pub requested_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoreBookRow {
    pub date: NaiveDate,
    pub particulars: String,
    pub product_code: Option<String>,
    pub product_name: Option<String>,
    /// Internal batch number of the carrying picking
    pub batch: Option<String>,
    pub grade: Option<String>,
    pub vendor: Option<String>,
    pub invoice_no: Option<String>,
    pub received_qty: Decimal,
    pub issued_qty: Decimal,
    pub balance_qty: Decimal,
    pub memo_no: Option<String>,
}

fn opening_row(date: NaiveDate, balance: Decimal) -> StoreBookRow {
    StoreBookRow {
        date,
        particulars: "Opening Balance".to_string(),
        product_code: None,
        product_name: None,
        batch: None,
        grade: None,
        vendor: None,
        invoice_no: None,
        received_qty: Decimal::ZERO,
        issued_qty: Decimal::ZERO,
        balance_qty: balance,
        memo_no: None,
    }
}

#[instrument(skip(mat, params), fields(requested_by = %params.requested_by))]
pub async fn run(
    mat: &Materializer,
    params: &StoreBookParams,
) -> Result<ReportOutput<StoreBookRow>, ServiceError> {
    params.validate()?;
    super::validate_period(params.date_from, params.date_to)?;

    let db = mat.db();
    let usages = ledger::load_location_usages(db).await?;

    if let Some(loc) = params.location_id {
        let usage = usages
            .get(&loc)
            .ok_or_else(|| ServiceError::NotFound(format!("location {loc}")))?;
        if !usage.is_internal() {
            return Err(ServiceError::ValidationError(
                "store book location filter must be an internal location".to_string(),
            ));
        }
    }

    let products = product_map(db).await?;
    let matches_raw_type = |m: &stock_move::Model| match &params.raw_type {
        Some(raw_type) => products
            .get(&m.product_id)
            .and_then(|p| p.raw_type.as_deref())
            .is_some_and(|r| r.eq_ignore_ascii_case(raw_type)),
        None => true,
    };

    let opening_moves: Vec<stock_move::Model> = MoveQuery::before(params.date_from)
        .product(params.product_id)
        .party(params.party_id)
        .location(params.location_id)
        .fetch(db)
        .await?
        .into_iter()
        .filter(|m| matches_raw_type(m))
        .collect();
    let opening_records = ledger::to_records(&opening_moves, &usages)?;
    let opening = ledger::opening_balance(&opening_records, params.location_id);

    let period_moves: Vec<stock_move::Model> = MoveQuery::between(params.date_from, params.date_to)
        .product(params.product_id)
        .party(params.party_id)
        .location(params.location_id)
        .fetch(db)
        .await?
        .into_iter()
        .filter(|m| matches_raw_type(m))
        .collect();
    let records = ledger::to_records(&period_moves, &usages)?;
    let lines = ledger::accumulate(opening, &records, params.location_id);

    let pickings = picking_map(db, period_moves.iter().filter_map(|m| m.picking_id)).await?;
    let partners = partner_name_map(db).await?;

    let mut rows = Vec::with_capacity(period_moves.len() + 1);
    rows.push(opening_row(params.date_from, opening));

    for (mv, line) in period_moves.iter().zip(&lines) {
        let picking: Option<&stock_picking::Model> =
            mv.picking_id.and_then(|id| pickings.get(&id));
        let product = products.get(&mv.product_id);
        let vendor_id = mv.partner_id.or_else(|| picking.and_then(|p| p.partner_id));

        rows.push(StoreBookRow {
            date: mv.date.date_naive(),
            particulars: picking
                .and_then(|p| p.origin.clone())
                .unwrap_or_else(|| " ".to_string()),
            product_code: product.map(|p| p.code.clone()),
            product_name: product.map(|p| p.name.clone()),
            batch: picking.and_then(|p| p.internal_batch_number.clone()),
            grade: product.and_then(|p| p.grade.clone()),
            vendor: vendor_id.and_then(|id| partners.get(&id).cloned()),
            invoice_no: picking.and_then(|p| p.invoice_number.clone()),
            received_qty: line.received,
            issued_qty: line.issued,
            balance_qty: line.balance,
            memo_no: mv
                .reference
                .clone()
                .or_else(|| picking.map(|p| p.name.clone())),
        });
    }

    let run: RunSummary = mat.materialize(KIND, &params.requested_by, &rows).await?;
    Ok(ReportOutput { run, rows })
}
