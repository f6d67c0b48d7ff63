use crate::commands::{Command, CommandContext};
use crate::entities::{packing_memo, packing_memo_line, stock_picking};
use crate::errors::ServiceError;
use crate::events::Event;
use crate::ledger;
use crate::sequence::SequenceStore;
use async_trait::async_trait;
use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::IntCounter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

lazy_static! {
    static ref PACKING_MEMOS_CREATED: IntCounter = IntCounter::new(
        "packing_memos_created_total",
        "Total number of packing memos created"
    )
    .expect("metric can be created");
}

struct MemoSequenceStore<'a> {
    db: &'a DatabaseConnection,
}

#[async_trait]
impl SequenceStore for MemoSequenceStore<'_> {
    async fn max_code(&self, prefix: &str) -> Result<Option<String>, ServiceError> {
        let found = packing_memo::Entity::find()
            .filter(packing_memo::Column::Name.starts_with(prefix))
            .order_by_desc(packing_memo::Column::Name)
            .one(self.db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(found.map(|m| m.name))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackingMemoLineInput {
    pub product_id: Uuid,
    /// Batch to pack from; required
    pub lot_id: Option<Uuid>,
    /// Quantity ordered on the delivery
    pub quantity: Decimal,
    /// Quantity actually packed from the lot
    pub selected_qty: Decimal,
}

/// Builds a packing memo for a delivery picking. Every line must name a
/// lot and pack a positive quantity covered by that lot's on-hand
/// balance; the memo number comes from the `PM` sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePackingMemoCommand {
    pub picking_id: Uuid,
    pub lines: Vec<PackingMemoLineInput>,
}

#[async_trait]
impl Command for CreatePackingMemoCommand {
    type Result = packing_memo::Model;

    #[instrument(skip(self, ctx), fields(lines = self.lines.len()))]
    async fn execute(&self, ctx: &CommandContext) -> Result<Self::Result, ServiceError> {
        if self.lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "a packing memo needs at least one line".to_string(),
            ));
        }

        let db = ctx.db.as_ref();
        let picking = stock_picking::Entity::find_by_id(self.picking_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("picking {}", self.picking_id)))?;

        if picking.kind != stock_picking::PickingKind::Outgoing {
            return Err(ServiceError::InvalidOperation(format!(
                "picking {} is not a delivery order",
                picking.name
            )));
        }

        // All lines validate before anything is written.
        for line in &self.lines {
            let lot_id = line.lot_id.ok_or_else(|| {
                ServiceError::ValidationError("please select a batch/lot".to_string())
            })?;
            if line.selected_qty <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "selected quantity must be greater than zero".to_string(),
                ));
            }
            let available = ledger::lot_available_qty(db, lot_id).await?;
            if line.selected_qty > available {
                return Err(ServiceError::ValidationError(format!(
                    "selected quantity {} exceeds available {} for the chosen lot",
                    line.selected_qty, available
                )));
            }
        }

        let now = Utc::now();
        let memo_id = Uuid::new_v4();
        let prefix = ctx.sequencer.memo_prefix(now);
        let store = MemoSequenceStore { db };
        let picking_id = picking.id;
        let partner_id = picking.partner_id;
        let sale_origin = picking.origin.clone();

        let name = ctx
            .sequencer
            .allocate(&store, &prefix, |candidate| {
                let sale_origin = sale_origin.clone();
                async move {
                    let memo = packing_memo::ActiveModel {
                        id: Set(memo_id),
                        name: Set(candidate),
                        picking_id: Set(picking_id),
                        sale_origin: Set(sale_origin),
                        partner_id: Set(partner_id),
                        created_at: Set(now),
                    };
                    memo.insert(db)
                        .await
                        .map(|_| ())
                        .map_err(ServiceError::db_error)
                }
            })
            .await?;

        for line in &self.lines {
            let model = packing_memo_line::ActiveModel {
                id: Set(Uuid::new_v4()),
                memo_id: Set(memo_id),
                product_id: Set(line.product_id),
                // validated above
                lot_id: Set(line.lot_id.unwrap_or_default()),
                quantity: Set(line.quantity),
                selected_qty: Set(line.selected_qty),
            };
            model.insert(db).await.map_err(ServiceError::db_error)?;
        }

        let memo = packing_memo::Entity::find_by_id(memo_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::InternalError("memo vanished after insert".to_string()))?;

        ctx.events
            .send(Event::PackingMemoCreated {
                memo_id,
                name: name.clone(),
                lines: self.lines.len(),
            })
            .await
            .map_err(ServiceError::EventError)?;

        info!(memo = %name, picking_id = %picking_id, "packing memo created");
        PACKING_MEMOS_CREATED.inc();

        Ok(memo)
    }
}
