pub mod downtime_entry;
pub mod job_party;
pub mod packing_memo;
pub mod packing_memo_line;
pub mod partner;
pub mod product;
pub mod production_order;
pub mod report_row;
pub mod stock_location;
pub mod stock_lot;
pub mod stock_move;
pub mod stock_picking;
pub mod work_center;
pub mod work_center_shift;
