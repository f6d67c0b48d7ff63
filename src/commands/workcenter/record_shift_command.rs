use crate::commands::{Command, CommandContext};
use crate::entities::work_center;
use crate::entities::work_center_shift::{self, ShiftCode};
use crate::errors::ServiceError;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

/// Records one 8-hour shift at a work center. A (work center, date, code)
/// combination can only be recorded once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordShiftCommand {
    pub work_center_id: Uuid,
    pub date: NaiveDate,
    pub code: ShiftCode,
    pub target_qty: Decimal,
    pub produced_qty: Decimal,
    pub rejected_qty: Decimal,
    pub operator: Option<String>,
}

#[async_trait]
impl Command for RecordShiftCommand {
    type Result = work_center_shift::Model;

    #[instrument(skip(self, ctx))]
    async fn execute(&self, ctx: &CommandContext) -> Result<Self::Result, ServiceError> {
        if self.target_qty < Decimal::ZERO
            || self.produced_qty < Decimal::ZERO
            || self.rejected_qty < Decimal::ZERO
        {
            return Err(ServiceError::ValidationError(
                "shift quantities cannot be negative".to_string(),
            ));
        }
        if self.rejected_qty > self.produced_qty {
            return Err(ServiceError::ValidationError(
                "rejected quantity cannot exceed produced quantity".to_string(),
            ));
        }

        let db = ctx.db.as_ref();
        work_center::Entity::find_by_id(self.work_center_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("work center {}", self.work_center_id))
            })?;

        let existing = work_center_shift::Entity::find()
            .filter(work_center_shift::Column::WorkCenterId.eq(self.work_center_id))
            .filter(work_center_shift::Column::Date.eq(self.date))
            .filter(work_center_shift::Column::Code.eq(self.code))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_some() {
            return Err(ServiceError::InvalidOperation(format!(
                "shift {:?} on {} is already recorded for this work center",
                self.code, self.date
            )));
        }

        let model = work_center_shift::ActiveModel {
            id: Set(Uuid::new_v4()),
            work_center_id: Set(self.work_center_id),
            date: Set(self.date),
            code: Set(self.code),
            target_qty: Set(self.target_qty),
            produced_qty: Set(self.produced_qty),
            rejected_qty: Set(self.rejected_qty),
            operator: Set(self.operator.clone()),
            created_at: Set(Utc::now()),
        };
        let shift = model.insert(db).await.map_err(ServiceError::db_error)?;

        info!(
            work_center_id = %self.work_center_id,
            date = %self.date,
            code = ?self.code,
            "shift recorded"
        );
        Ok(shift)
    }
}
