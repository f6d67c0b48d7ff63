//! RM grade-wise stock ledger: raw-material moves touching internal
//! storage, filterable by RM type (category) and grade.

use super::{lot_map, partner_name_map, picking_map, product_map, Materializer, ReportOutput};
use crate::entities::{product, stock_move};
use crate::errors::ServiceError;
use crate::ledger::{self, MoveQuery};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const KIND: &str = "grade_stock";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct GradeStockParams {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub party_id: Option<Uuid>,
    /// RM type (product category)
    pub rm_type: Option<String>,
    pub grade: Option<String>,
    #[validate(length(min = 1, message = "Requesting user cannot be empty"))]
    pub requested_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GradeStockRow {
    pub date: NaiveDate,
    pub particulars: Option<String>,
    pub product_code: Option<String>,
    pub product_name: Option<String>,
    pub rm_type: Option<String>,
    /// Lot carried by the move
    pub batch: Option<String>,
    pub grade: Option<String>,
    pub vendor: Option<String>,
    pub invoice_no: Option<String>,
    pub received_qty: Decimal,
    pub issued_qty: Decimal,
    pub balance_qty: Decimal,
    pub memo_no: Option<String>,
}

fn product_selected(
    products: &HashMap<Uuid, product::Model>,
    params: &GradeStockParams,
    product_id: Uuid,
) -> bool {
    let Some(product) = products.get(&product_id) else {
        return false;
    };
    if let Some(rm_type) = &params.rm_type {
        if !product
            .category
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(rm_type))
        {
            return false;
        }
    }
    if let Some(grade) = &params.grade {
        if !product
            .grade
            .as_deref()
            .is_some_and(|g| g.eq_ignore_ascii_case(grade))
        {
            return false;
        }
    }
    true
}

/// Keeps only moves with at least one internal side; fully external
/// traffic is invisible to the RM ledger.
fn touches_internal(records: &[ledger::MoveRecord]) -> Vec<ledger::MoveRecord> {
    records
        .iter()
        .filter(|r| r.source.usage.is_internal() || r.dest.usage.is_internal())
        .cloned()
        .collect()
}

#[instrument(skip(mat, params), fields(requested_by = %params.requested_by))]
pub async fn run(
    mat: &Materializer,
    params: &GradeStockParams,
) -> Result<ReportOutput<GradeStockRow>, ServiceError> {
    params.validate()?;
    super::validate_period(params.date_from, params.date_to)?;

    let db = mat.db();
    let usages = ledger::load_location_usages(db).await?;
    let products = product_map(db).await?;

    let opening_moves: Vec<stock_move::Model> = MoveQuery::before(params.date_from)
        .party(params.party_id)
        .raw_material_only()
        .fetch(db)
        .await?
        .into_iter()
        .filter(|m| product_selected(&products, params, m.product_id))
        .collect();
    let opening_records = touches_internal(&ledger::to_records(&opening_moves, &usages)?);
    let opening = ledger::opening_balance(&opening_records, None);

    let period_moves: Vec<stock_move::Model> = MoveQuery::between(params.date_from, params.date_to)
        .party(params.party_id)
        .raw_material_only()
        .fetch(db)
        .await?
        .into_iter()
        .filter(|m| product_selected(&products, params, m.product_id))
        .collect();
    let all_records = ledger::to_records(&period_moves, &usages)?;
    let keep: Vec<bool> = all_records
        .iter()
        .map(|r| r.source.usage.is_internal() || r.dest.usage.is_internal())
        .collect();
    let records: Vec<ledger::MoveRecord> = all_records
        .into_iter()
        .zip(keep.iter())
        .filter_map(|(r, keep)| keep.then_some(r))
        .collect();
    let kept_moves: Vec<&stock_move::Model> = period_moves
        .iter()
        .zip(keep.iter())
        .filter_map(|(m, keep)| keep.then_some(m))
        .collect();

    let lines = ledger::accumulate(opening, &records, None);

    let pickings = picking_map(db, kept_moves.iter().filter_map(|m| m.picking_id)).await?;
    let partners = partner_name_map(db).await?;
    let lots = lot_map(db).await?;

    let mut rows = Vec::with_capacity(kept_moves.len());
    for (mv, line) in kept_moves.iter().zip(&lines) {
        let picking = mv.picking_id.and_then(|id| pickings.get(&id));
        let product = products.get(&mv.product_id);

        rows.push(GradeStockRow {
            date: mv.date.date_naive(),
            particulars: picking.map(|p| p.name.clone()),
            product_code: product.map(|p| p.code.clone()),
            product_name: product.map(|p| p.name.clone()),
            rm_type: product.and_then(|p| p.category.clone()),
            batch: mv.lot_id.and_then(|id| lots.get(&id)).map(|l| l.name.clone()),
            grade: product.and_then(|p| p.grade.clone()),
            vendor: picking
                .and_then(|p| p.partner_id)
                .and_then(|id| partners.get(&id).cloned()),
            invoice_no: picking.and_then(|p| p.invoice_number.clone()),
            received_qty: line.received,
            issued_qty: line.issued,
            balance_qty: line.balance,
            memo_no: picking.map(|p| p.name.clone()),
        });
    }

    let run = mat.materialize(KIND, &params.requested_by, &rows).await?;
    Ok(ReportOutput { run, rows })
}
