//! Movement ledger core: date-bounded queries over finalized stock moves,
//! inward/outward classification, opening balances and the running-balance
//! accumulator every stock report is built on.
//!
//! Classification rule: with an explicit reference location, direction is
//! decided by identity match against it; without one, by the `internal`
//! usage of the two sides. A move between two internal locations (or with
//! both sides equal to the reference) is neutral: it contributes zero,
//! and is neither counted twice nor skipped.

use crate::entities::stock_location::{self, LocationUsage};
use crate::entities::{product, stock_move};
use crate::errors::ServiceError;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Condition,
};
use std::collections::HashMap;
use uuid::Uuid;

/// One side of a move, as much as direction classification needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationRef {
    pub id: Uuid,
    pub usage: LocationUsage,
}

/// Projection of a finalized stock move used by balance computation.
#[derive(Debug, Clone)]
pub struct MoveRecord {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub source: LocationRef,
    pub dest: LocationRef,
}

/// Received/issued split of a single move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flow {
    pub received: Decimal,
    pub issued: Decimal,
}

impl Flow {
    /// Classifies a move as inward, outward or neutral.
    pub fn classify(m: &MoveRecord, reference: Option<Uuid>) -> Flow {
        let mut flow = Flow::default();
        match reference {
            Some(loc) => {
                // Identity match against the selected location. A move
                // looping on the reference location is neutral.
                if m.dest.id == loc && m.source.id != loc {
                    flow.received = m.quantity;
                } else if m.source.id == loc && m.dest.id != loc {
                    flow.issued = m.quantity;
                }
            }
            None => {
                let src_internal = m.source.usage.is_internal();
                let dest_internal = m.dest.usage.is_internal();
                if dest_internal && !src_internal {
                    flow.received = m.quantity;
                } else if src_internal && !dest_internal {
                    flow.issued = m.quantity;
                }
                // internal -> internal: neutral
            }
        }
        flow
    }

    pub fn net(&self) -> Decimal {
        self.received - self.issued
    }
}

/// Sums the signed flow of `moves`; used for balances before a period.
pub fn opening_balance(moves: &[MoveRecord], reference: Option<Uuid>) -> Decimal {
    moves
        .iter()
        .map(|m| Flow::classify(m, reference).net())
        .sum()
}

/// One emitted ledger row with its running-balance snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerLine {
    pub move_id: Uuid,
    pub received: Decimal,
    pub issued: Decimal,
    pub balance: Decimal,
}

/// Walks `moves` in the given order, carrying the running balance.
/// Deterministic: a fixed input yields byte-for-byte identical output.
pub fn accumulate(
    opening: Decimal,
    moves: &[MoveRecord],
    reference: Option<Uuid>,
) -> Vec<LedgerLine> {
    let mut balance = opening;
    moves
        .iter()
        .map(|m| {
            let flow = Flow::classify(m, reference);
            balance += flow.net();
            LedgerLine {
                move_id: m.id,
                received: flow.received,
                issued: flow.issued,
                balance,
            }
        })
        .collect()
}

fn day_start(d: NaiveDate) -> DateTime<Utc> {
    d.and_time(NaiveTime::MIN).and_utc()
}

fn day_end(d: NaiveDate) -> DateTime<Utc> {
    d.and_hms_milli_opt(23, 59, 59, 999)
        .map(|t| t.and_utc())
        .unwrap_or_else(|| day_start(d))
}

/// Filterable query over finalized stock moves, ordered `(date, id)`.
#[derive(Debug, Clone, Default)]
pub struct MoveQuery {
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub product_id: Option<Uuid>,
    pub party_id: Option<Uuid>,
    pub partner_id: Option<Uuid>,
    /// Restrict to moves touching this location on either side
    pub location_id: Option<Uuid>,
    pub lot_id: Option<Uuid>,
    /// Restrict by product flags (raw material = purchasable, non-saleable)
    pub purchase_ok: Option<bool>,
    pub sale_ok: Option<bool>,
}

impl MoveQuery {
    /// Moves inside `[from, to]`, inclusive on whole days.
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            date_from: Some(day_start(from)),
            date_to: Some(day_end(to)),
            ..Default::default()
        }
    }

    /// Moves strictly before the start of `date`, the opening-balance window.
    pub fn before(date: NaiveDate) -> Self {
        Self {
            date_to: Some(day_start(date) - chrono::Duration::milliseconds(1)),
            ..Default::default()
        }
    }

    /// Moves up to and including the whole of `date`.
    pub fn as_on(date: NaiveDate) -> Self {
        Self {
            date_to: Some(day_end(date)),
            ..Default::default()
        }
    }

    pub fn product(mut self, id: Option<Uuid>) -> Self {
        self.product_id = id;
        self
    }

    pub fn party(mut self, id: Option<Uuid>) -> Self {
        self.party_id = id;
        self
    }

    pub fn partner(mut self, id: Option<Uuid>) -> Self {
        self.partner_id = id;
        self
    }

    pub fn location(mut self, id: Option<Uuid>) -> Self {
        self.location_id = id;
        self
    }

    pub fn lot(mut self, id: Option<Uuid>) -> Self {
        self.lot_id = id;
        self
    }

    /// Raw-material restriction: purchasable and not saleable.
    pub fn raw_material_only(mut self) -> Self {
        self.purchase_ok = Some(true);
        self.sale_ok = Some(false);
        self
    }

    /// Runs the query, returning matching `done` moves oldest first.
    pub async fn fetch(
        &self,
        db: &DatabaseConnection,
    ) -> Result<Vec<stock_move::Model>, ServiceError> {
        let mut select = stock_move::Entity::find()
            .filter(stock_move::Column::State.eq(stock_move::MoveState::Done));

        if let Some(from) = self.date_from {
            select = select.filter(stock_move::Column::Date.gte(from));
        }
        if let Some(to) = self.date_to {
            select = select.filter(stock_move::Column::Date.lte(to));
        }
        if let Some(id) = self.product_id {
            select = select.filter(stock_move::Column::ProductId.eq(id));
        }
        if let Some(id) = self.party_id {
            select = select.filter(stock_move::Column::PartyId.eq(id));
        }
        if let Some(id) = self.partner_id {
            select = select.filter(stock_move::Column::PartnerId.eq(id));
        }
        if let Some(id) = self.lot_id {
            select = select.filter(stock_move::Column::LotId.eq(id));
        }
        if let Some(id) = self.location_id {
            select = select.filter(
                Condition::any()
                    .add(stock_move::Column::SourceLocationId.eq(id))
                    .add(stock_move::Column::DestLocationId.eq(id)),
            );
        }
        if self.purchase_ok.is_some() || self.sale_ok.is_some() {
            select = select.inner_join(product::Entity);
            if let Some(flag) = self.purchase_ok {
                select = select.filter(product::Column::PurchaseOk.eq(flag));
            }
            if let Some(flag) = self.sale_ok {
                select = select.filter(product::Column::SaleOk.eq(flag));
            }
        }

        select
            .order_by_asc(stock_move::Column::Date)
            .order_by_asc(stock_move::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }
}

/// Loads the id → usage map for every location; report runs resolve move
/// sides against it instead of joining per move.
pub async fn load_location_usages(
    db: &DatabaseConnection,
) -> Result<HashMap<Uuid, LocationUsage>, ServiceError> {
    let locations = stock_location::Entity::find()
        .all(db)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(locations.into_iter().map(|l| (l.id, l.usage)).collect())
}

/// Projects fetched moves into [`MoveRecord`]s. A move pointing at an
/// unknown location is a data fault and surfaces as an internal error.
pub fn to_records(
    moves: &[stock_move::Model],
    usages: &HashMap<Uuid, LocationUsage>,
) -> Result<Vec<MoveRecord>, ServiceError> {
    moves
        .iter()
        .map(|m| {
            let source = LocationRef {
                id: m.source_location_id,
                usage: *usages.get(&m.source_location_id).ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "move {} references unknown location {}",
                        m.id, m.source_location_id
                    ))
                })?,
            };
            let dest = LocationRef {
                id: m.dest_location_id,
                usage: *usages.get(&m.dest_location_id).ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "move {} references unknown location {}",
                        m.id, m.dest_location_id
                    ))
                })?,
            };
            Ok(MoveRecord {
                id: m.id,
                date: m.date,
                product_id: m.product_id,
                quantity: m.quantity,
                source,
                dest,
            })
        })
        .collect()
}

/// Net on-hand balance of a lot across internal locations, as of now.
pub async fn lot_available_qty(
    db: &DatabaseConnection,
    lot_id: Uuid,
) -> Result<Decimal, ServiceError> {
    let moves = MoveQuery::default().lot(Some(lot_id)).fetch(db).await?;
    let usages = load_location_usages(db).await?;
    let records = to_records(&moves, &usages)?;
    Ok(opening_balance(&records, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn loc(usage: LocationUsage) -> LocationRef {
        LocationRef {
            id: Uuid::new_v4(),
            usage,
        }
    }

    fn mv(qty: Decimal, source: LocationRef, dest: LocationRef, day: u32) -> MoveRecord {
        MoveRecord {
            id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2025, 1, day)
                .unwrap()
                .and_time(NaiveTime::MIN)
                .and_utc(),
            product_id: Uuid::new_v4(),
            quantity: qty,
            source,
            dest,
        }
    }

    #[rstest::rstest]
    #[case(LocationUsage::Supplier, LocationUsage::Internal, dec!(5), dec!(0))]
    #[case(LocationUsage::Internal, LocationUsage::Customer, dec!(0), dec!(3))]
    #[case(LocationUsage::Production, LocationUsage::Internal, dec!(5), dec!(0))]
    #[case(LocationUsage::Internal, LocationUsage::Scrap, dec!(0), dec!(3))]
    #[case(LocationUsage::Supplier, LocationUsage::Customer, dec!(0), dec!(0))]
    fn classify_by_usage(
        #[case] src: LocationUsage,
        #[case] dst: LocationUsage,
        #[case] received: Decimal,
        #[case] issued: Decimal,
    ) {
        let qty = if received.is_zero() && issued.is_zero() {
            dec!(7)
        } else {
            received + issued
        };
        let flow = Flow::classify(&mv(qty, loc(src), loc(dst), 1), None);
        assert_eq!(flow.received, received);
        assert_eq!(flow.issued, issued);
    }

    #[test]
    fn internal_transfer_is_neutral() {
        let a = loc(LocationUsage::Internal);
        let b = loc(LocationUsage::Internal);
        let flow = Flow::classify(&mv(dec!(10), a, b, 1), None);
        assert_eq!(flow.received, dec!(0));
        assert_eq!(flow.issued, dec!(0));
        assert_eq!(flow.net(), dec!(0));
    }

    #[test]
    fn classify_by_reference_location() {
        let store = loc(LocationUsage::Internal);
        let floor = loc(LocationUsage::Internal);

        let inward = Flow::classify(&mv(dec!(4), floor, store, 1), Some(store.id));
        assert_eq!(inward.received, dec!(4));

        let outward = Flow::classify(&mv(dec!(4), store, floor, 1), Some(store.id));
        assert_eq!(outward.issued, dec!(4));

        // the other store's traffic is invisible to this reference
        let elsewhere = Flow::classify(&mv(dec!(4), floor, floor, 1), Some(store.id));
        assert_eq!(elsewhere, Flow::default());
    }

    #[test]
    fn running_balance_scenario() {
        let supplier = loc(LocationUsage::Supplier);
        let internal = loc(LocationUsage::Internal);
        let customer = loc(LocationUsage::Customer);

        let moves = vec![
            mv(dec!(100), supplier, internal, 1),
            mv(dec!(30), internal, customer, 2),
            mv(dec!(20), internal, customer, 3),
        ];

        let lines = accumulate(dec!(0), &moves, None);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].balance, dec!(100));
        assert_eq!(lines[0].received, dec!(100));
        assert_eq!(lines[1].balance, dec!(70));
        assert_eq!(lines[1].issued, dec!(30));
        assert_eq!(lines[2].balance, dec!(50));
        assert_eq!(lines[2].issued, dec!(20));
    }

    #[test]
    fn opening_plus_flows_equals_closing() {
        let supplier = loc(LocationUsage::Supplier);
        let internal = loc(LocationUsage::Internal);
        let other_internal = loc(LocationUsage::Internal);

        let moves = vec![
            mv(dec!(50), supplier, internal, 1),
            mv(dec!(10), internal, other_internal, 2),
            mv(dec!(5), internal, supplier, 3),
        ];

        let opening = dec!(7);
        let lines = accumulate(opening, &moves, None);
        let received: Decimal = lines.iter().map(|l| l.received).sum();
        let issued: Decimal = lines.iter().map(|l| l.issued).sum();
        assert_eq!(
            lines.last().map(|l| l.balance),
            Some(opening + received - issued)
        );
    }
}
