pub mod record_downtime_command;
pub mod record_shift_command;

pub use record_downtime_command::RecordDowntimeCommand;
pub use record_shift_command::RecordShiftCommand;
