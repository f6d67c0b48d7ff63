pub mod reorder;
pub mod stock;
