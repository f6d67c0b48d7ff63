//! RM stock sheet: as-on-date stock grouped by party, location, product,
//! grade and supplier batch.
//!
//! Unlike the running ledgers this is a per-location grouping: an
//! internal-to-internal transfer moves quantity between two groups
//! (credited at the destination, debited at the source), so the sheet
//! total still nets to the company-wide balance.

use super::{location_name_map, party_name_map, picking_map, product_map, Materializer, ReportOutput};
use crate::entities::stock_move;
use crate::errors::ServiceError;
use crate::ledger::{self, MoveQuery};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const KIND: &str = "stock_sheet";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct StockSheetParams {
    /// As-on date; all finalized moves up to and including it count
    pub date: NaiveDate,
    pub party_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    /// RM type (product category)
    pub rm_type: Option<String>,
    #[validate(length(min = 1, message = "Requesting user cannot be empty"))]
    pub requested_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StockSheetRow {
    pub date: NaiveDate,
    pub party: Option<String>,
    pub location: Option<String>,
    pub product_code: Option<String>,
    pub product_name: Option<String>,
    pub grade: Option<String>,
    pub mfi: Option<String>,
    /// Supplier batch number from the receiving picking
    pub batch: Option<String>,
    pub bag_qty: Decimal,
    pub kgs: Decimal,
    pub total_kgs: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    party: Option<Uuid>,
    location: Uuid,
    product: Uuid,
    grade: String,
    batch: String,
    mfi: String,
}

#[derive(Debug, Default)]
struct GroupAgg {
    bag_qty: Decimal,
    kgs: Decimal,
}

#[instrument(skip(mat, params), fields(requested_by = %params.requested_by))]
pub async fn run(
    mat: &Materializer,
    params: &StockSheetParams,
) -> Result<ReportOutput<StockSheetRow>, ServiceError> {
    params.validate()?;

    let db = mat.db();
    let usages = ledger::load_location_usages(db).await?;
    let products = product_map(db).await?;

    let moves: Vec<stock_move::Model> = MoveQuery::as_on(params.date)
        .product(params.product_id)
        .party(params.party_id)
        .raw_material_only()
        .fetch(db)
        .await?
        .into_iter()
        .filter(|m| match &params.rm_type {
            Some(rm_type) => products
                .get(&m.product_id)
                .and_then(|p| p.category.as_deref())
                .is_some_and(|c| c.eq_ignore_ascii_case(rm_type)),
            None => true,
        })
        .collect();

    let records = ledger::to_records(&moves, &usages)?;
    let pickings = picking_map(db, moves.iter().filter_map(|m| m.picking_id)).await?;

    let mut aggregated: BTreeMap<GroupKey, GroupAgg> = BTreeMap::new();

    for (mv, record) in moves.iter().zip(&records) {
        // (location, signed delta) contributions of this move
        let mut contributions: Vec<(Uuid, Decimal)> = Vec::with_capacity(2);
        match params.location_id {
            Some(loc) => {
                if record.dest.id == loc {
                    contributions.push((loc, record.quantity));
                }
                if record.source.id == loc {
                    contributions.push((loc, -record.quantity));
                }
            }
            None => {
                if record.dest.usage.is_internal() {
                    contributions.push((record.dest.id, record.quantity));
                }
                if record.source.usage.is_internal() {
                    contributions.push((record.source.id, -record.quantity));
                }
            }
        }
        if contributions.is_empty() {
            continue;
        }

        let picking = mv.picking_id.and_then(|id| pickings.get(&id));
        let product = products.get(&mv.product_id);
        let grade = product
            .and_then(|p| p.grade.clone())
            .unwrap_or_default();
        let batch = picking
            .and_then(|p| p.supplier_batch_number.clone())
            .unwrap_or_default();
        let mfi = picking
            .and_then(|p| p.mfi_value)
            .map(|v| v.to_string())
            .unwrap_or_default();
        let bags = picking
            .and_then(|p| p.number_of_bags)
            .map(Decimal::from)
            .unwrap_or_default();

        for (location, delta) in contributions {
            let entry = aggregated
                .entry(GroupKey {
                    party: mv.party_id,
                    location,
                    product: mv.product_id,
                    grade: grade.clone(),
                    batch: batch.clone(),
                    mfi: mfi.clone(),
                })
                .or_default();
            // bags only arrive with inward deltas
            if delta > Decimal::ZERO {
                entry.bag_qty += bags;
            }
            entry.kgs += delta;
        }
    }

    let parties = party_name_map(db).await?;
    let locations = location_name_map(db).await?;

    let rows: Vec<StockSheetRow> = aggregated
        .into_iter()
        .filter(|(_, agg)| !agg.kgs.is_zero())
        .map(|(key, agg)| {
            let product = products.get(&key.product);
            StockSheetRow {
                date: params.date,
                party: key.party.and_then(|id| parties.get(&id).cloned()),
                location: locations.get(&key.location).cloned(),
                product_code: product.map(|p| p.code.clone()),
                product_name: product.map(|p| p.name.clone()),
                grade: (!key.grade.is_empty()).then_some(key.grade),
                mfi: (!key.mfi.is_empty()).then_some(key.mfi),
                batch: (!key.batch.is_empty()).then_some(key.batch),
                bag_qty: agg.bag_qty,
                kgs: agg.kgs,
                total_kgs: agg.kgs,
            }
        })
        .collect();

    let run = mat.materialize(KIND, &params.requested_by, &rows).await?;
    Ok(ReportOutput { run, rows })
}
