use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product variant. `code` is the internal part code whose leading
/// characters seed the internal batch prefix.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub code: String,
    pub name: String,
    /// RM grade label (e.g. "HD-M60075")
    pub grade: Option<String>,
    pub raw_type: Option<String>,
    pub category: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub unit_weight_kg: Option<Decimal>,
    /// Purchasable (raw materials, consumables)
    pub purchase_ok: bool,
    /// Saleable (finished goods)
    pub sale_ok: bool,
    /// Per-product purchase lead time override, in days
    pub lead_time_days: Option<f64>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_move::Entity")]
    StockMove,
    #[sea_orm(has_many = "super::stock_lot::Entity")]
    StockLot,
}

impl Related<super::stock_move::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockMove.def()
    }
}

impl Related<super::stock_lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockLot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
