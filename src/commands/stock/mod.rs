pub mod acknowledge_delay_command;
pub mod finalize_picking_command;

pub use acknowledge_delay_command::AcknowledgeDelayCommand;
pub use finalize_picking_command::FinalizePickingCommand;
