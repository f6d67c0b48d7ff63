use crate::commands::{Command, CommandContext};
use crate::entities::downtime_entry::{self, DowntimeReason};
use crate::entities::work_center;
use crate::errors::ServiceError;
use crate::events::Event;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

/// Records one downtime interval against a work center.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDowntimeCommand {
    pub work_center_id: Uuid,
    pub shift_id: Option<Uuid>,
    pub reason: DowntimeReason,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub note: Option<String>,
}

#[async_trait]
impl Command for RecordDowntimeCommand {
    type Result = downtime_entry::Model;

    #[instrument(skip(self, ctx))]
    async fn execute(&self, ctx: &CommandContext) -> Result<Self::Result, ServiceError> {
        if self.ended_at <= self.started_at {
            return Err(ServiceError::ValidationError(
                "downtime end must be after its start".to_string(),
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

        let model = downtime_entry::ActiveModel {
            id: Set(Uuid::new_v4()),
            work_center_id: Set(self.work_center_id),
            shift_id: Set(self.shift_id),
            reason: Set(self.reason),
            started_at: Set(self.started_at),
            ended_at: Set(self.ended_at),
            note: Set(self.note.clone()),
            created_at: Set(Utc::now()),
        };
        let entry = model.insert(db).await.map_err(ServiceError::db_error)?;

        ctx.events
            .send(Event::DowntimeRecorded {
                work_center_id: self.work_center_id,
                minutes: entry.minutes(),
            })
            .await
            .map_err(ServiceError::EventError)?;

        info!(
            work_center_id = %self.work_center_id,
            reason = %self.reason,
            minutes = entry.minutes(),
            "downtime recorded"
        );
        Ok(entry)
    }
}
