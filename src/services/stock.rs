use crate::entities::{stock_lot, stock_move};
use crate::errors::ServiceError;
use crate::ledger::{self, MoveQuery};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

/// Filter set accepted by the raw movement-ledger endpoint.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MoveFilter {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub product_id: Option<Uuid>,
    pub party_id: Option<Uuid>,
    pub partner_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
}

/// Read-side service over finalized stock moves and lot balances.
#[derive(Clone)]
pub struct StockService {
    db: Arc<DatabaseConnection>,
}

impl StockService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Finalized moves matching the filter, oldest first.
    #[instrument(skip(self))]
    pub async fn list_moves(
        &self,
        filter: &MoveFilter,
    ) -> Result<Vec<stock_move::Model>, ServiceError> {
        crate::reports::validate_period(filter.date_from, filter.date_to)?;
        MoveQuery::between(filter.date_from, filter.date_to)
            .product(filter.product_id)
            .party(filter.party_id)
            .partner(filter.partner_id)
            .location(filter.location_id)
            .fetch(&self.db)
            .await
    }

    /// Net on-hand balance of a lot across internal locations.
    #[instrument(skip(self))]
    pub async fn lot_available(&self, lot_id: Uuid) -> Result<Decimal, ServiceError> {
        stock_lot::Entity::find_by_id(lot_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("lot {lot_id}")))?;
        ledger::lot_available_qty(&self.db, lot_id).await
    }
}
