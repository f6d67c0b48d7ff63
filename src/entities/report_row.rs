use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Materialized report output. Every wizard run tags its rows with a
/// `run_id` so that concurrent runs never see each other's output; rows
/// past the configured retention are purged by the next run of the same
/// report kind.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report_rows")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub run_id: Uuid,
    /// Report kind discriminator (`store_book`, `grade_stock`, ...)
    pub report: String,
    pub line_no: i32,
    /// The typed row, serialized
    pub payload: Json,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
