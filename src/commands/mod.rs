use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::events::EventSender;
use crate::sequence::BatchSequencer;
use async_trait::async_trait;
use std::sync::Arc;

pub mod packing;
pub mod stock;
pub mod workcenter;

/// Dependencies every command executes against.
#[derive(Clone)]
pub struct CommandContext {
    pub db: Arc<DbPool>,
    pub events: EventSender,
    pub sequencer: Arc<BatchSequencer>,
}

/// Command trait for implementing the Command Pattern
///
/// Encapsulates one business operation: validated, executed against the
/// shared context, publishing events on success.
#[async_trait]
pub trait Command: Send + Sync {
    /// The return type of the command when executed successfully
    type Result;

    async fn execute(&self, ctx: &CommandContext) -> Result<Self::Result, ServiceError>;
}
