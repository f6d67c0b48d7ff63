use crate::commands::{Command, CommandContext};
use crate::entities::stock_picking;
use crate::errors::ServiceError;
use crate::events::Event;
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Records a delay reason against an overdue delivery so the dispatch
/// delay report stops listing it.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AcknowledgeDelayCommand {
    pub picking_id: Uuid,

    #[validate(length(min = 1, message = "Delay reason cannot be empty"))]
    pub reason: String,
}

#[async_trait]
impl Command for AcknowledgeDelayCommand {
    type Result = ();

    #[instrument(skip(self, ctx))]
    async fn execute(&self, ctx: &CommandContext) -> Result<Self::Result, ServiceError> {
        self.validate()?;

        let db = ctx.db.as_ref();
        let picking = stock_picking::Entity::find_by_id(self.picking_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("picking {}", self.picking_id)))?;

        if picking.state == stock_picking::PickingState::Done {
            return Err(ServiceError::InvalidOperation(format!(
                "picking {} is already dispatched",
                picking.name
            )));
        }

        let picking_id = picking.id;
        let mut active: stock_picking::ActiveModel = picking.into();
        active.delay_acknowledged = Set(true);
        active.delay_reason = Set(Some(self.reason.clone()));
        active.update(db).await.map_err(ServiceError::db_error)?;

        ctx.events
            .send(Event::DispatchDelayAcknowledged {
                picking_id,
                reason: self.reason.clone(),
            })
            .await
            .map_err(ServiceError::EventError)?;

        info!(picking_id = %picking_id, "dispatch delay acknowledged");
        Ok(())
    }
}
