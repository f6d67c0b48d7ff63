use crate::commands::{Command, CommandContext};
use crate::entities::{product, stock_move, stock_picking};
use crate::errors::ServiceError;
use crate::events::Event;
use crate::sequence::SequenceStore;
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use lazy_static::lazy_static;
use prometheus::IntCounter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;

lazy_static! {
    static ref PICKINGS_FINALIZED: IntCounter = IntCounter::new(
        "pickings_finalized_total",
        "Total number of finalized pickings"
    )
    .expect("metric can be created");
    static ref PICKING_FINALIZE_FAILURES: IntCounter = IntCounter::new(
        "picking_finalize_failures_total",
        "Total number of failed picking finalizations"
    )
    .expect("metric can be created");
}

/// Scans existing internal batch numbers for the highest code under a prefix.
struct PickingBatchStore<'a> {
    db: &'a DatabaseConnection,
}

#[async_trait]
impl SequenceStore for PickingBatchStore<'_> {
    async fn max_code(&self, prefix: &str) -> Result<Option<String>, ServiceError> {
        let found = stock_picking::Entity::find()
            .filter(stock_picking::Column::InternalBatchNumber.starts_with(prefix))
            .order_by_desc(stock_picking::Column::InternalBatchNumber)
            .one(self.db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(found.and_then(|p| p.internal_batch_number))
    }
}

/// Marks a draft picking and its moves as done. Incoming raw-material
/// pickings get their internal batch number allocated here, once; the
/// code never changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizePickingCommand {
    pub picking_id: Uuid,
}

#[async_trait]
impl Command for FinalizePickingCommand {
    type Result = stock_picking::Model;

    #[instrument(skip(self, ctx))]
    async fn execute(&self, ctx: &CommandContext) -> Result<Self::Result, ServiceError> {
        let db = ctx.db.as_ref();

        let picking = stock_picking::Entity::find_by_id(self.picking_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                PICKING_FINALIZE_FAILURES.inc();
                ServiceError::NotFound(format!("picking {}", self.picking_id))
            })?;

        match picking.state {
            stock_picking::PickingState::Done => {
                PICKING_FINALIZE_FAILURES.inc();
                return Err(ServiceError::InvalidOperation(format!(
                    "picking {} is already finalized",
                    picking.name
                )));
            }
            stock_picking::PickingState::Cancel => {
                PICKING_FINALIZE_FAILURES.inc();
                return Err(ServiceError::InvalidOperation(format!(
                    "picking {} is cancelled",
                    picking.name
                )));
            }
            stock_picking::PickingState::Draft => {}
        }

        let moves = stock_move::Entity::find()
            .filter(stock_move::Column::PickingId.eq(picking.id))
            .filter(stock_move::Column::State.eq(stock_move::MoveState::Draft))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let now = Utc::now();
        let moves_done = moves.len();
        let picking_id = picking.id;

        let finalized = db
            .transaction::<_, stock_picking::Model, ServiceError>(|txn| {
                let picking = picking.clone();
                let moves = moves.clone();
                Box::pin(async move {
                    for mv in moves {
                        let mut active: stock_move::ActiveModel = mv.into();
                        active.state = Set(stock_move::MoveState::Done);
                        active.update(txn).await.map_err(|e| {
                            error!(error = %e, "failed to finalize move");
                            ServiceError::db_error(e)
                        })?;
                    }

                    let mut active: stock_picking::ActiveModel = picking.into();
                    active.state = Set(stock_picking::PickingState::Done);
                    active.date_done = Set(Some(now));
                    active.update(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(|e| match e {
                sea_orm::TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                sea_orm::TransactionError::Transaction(service_err) => service_err,
            })?;

        // Batch number allocation happens after the state flip so a failed
        // allocation never leaves half-finalized moves behind.
        let mut finalized = finalized;
        if finalized.kind == stock_picking::PickingKind::Incoming
            && finalized.internal_batch_number.is_none()
        {
            let product_code = match moves_first_product(db, picking_id).await? {
                Some(p) => Some(p.code),
                None => None,
            };
            let prefix = ctx
                .sequencer
                .product_prefix(product_code.as_deref(), now.year());

            let store = PickingBatchStore { db };
            let code = ctx
                .sequencer
                .allocate(&store, &prefix, |candidate| async move {
                    let mut active = stock_picking::ActiveModel {
                        id: Set(picking_id),
                        ..Default::default()
                    };
                    active.internal_batch_number = Set(Some(candidate));
                    active
                        .update(db)
                        .await
                        .map(|_| ())
                        .map_err(ServiceError::db_error)
                })
                .await?;

            finalized.internal_batch_number = Some(code.clone());

            ctx.events
                .send(Event::BatchNumberAssigned {
                    picking_id,
                    code,
                })
                .await
                .map_err(ServiceError::EventError)?;
        }

        ctx.events
            .send(Event::PickingFinalized {
                picking_id,
                moves_done,
            })
            .await
            .map_err(ServiceError::EventError)?;

        info!(
            picking_id = %picking_id,
            moves_done,
            batch = finalized.internal_batch_number.as_deref().unwrap_or(""),
            "picking finalized"
        );
        PICKINGS_FINALIZED.inc();

        Ok(finalized)
    }
}

/// Product of the picking's first move, whose code seeds the batch prefix.
async fn moves_first_product(
    db: &DatabaseConnection,
    picking_id: Uuid,
) -> Result<Option<product::Model>, ServiceError> {
    let first_move = stock_move::Entity::find()
        .filter(stock_move::Column::PickingId.eq(picking_id))
        .order_by_asc(stock_move::Column::CreatedAt)
        .order_by_asc(stock_move::Column::Id)
        .one(db)
        .await
        .map_err(ServiceError::db_error)?;

    match first_move {
        Some(mv) => product::Entity::find_by_id(mv.product_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error),
        None => Ok(None),
    }
}
