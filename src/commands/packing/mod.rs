pub mod create_packing_memo_command;

pub use create_packing_memo_command::{CreatePackingMemoCommand, PackingMemoLineInput};
