use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum MoveState {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "done")]
    Done,
    #[sea_orm(string_value = "cancel")]
    Cancel,
}

/// One inventory transfer between two locations.
///
/// Quantity is a positive magnitude; direction is implied by the
/// source/destination locations. A move in state `done` is immutable and
/// is the only state that participates in balance computation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_moves")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub picking_id: Option<Uuid>,
    pub product_id: Uuid,
    pub lot_id: Option<Uuid>,
    pub party_id: Option<Uuid>,
    pub partner_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    pub source_location_id: Uuid,
    pub dest_location_id: Uuid,
    pub date: DateTimeUtc,
    pub state: MoveState,
    /// Free-form reference (memo number, challan)
    pub reference: Option<String>,
    pub production_order_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::stock_picking::Entity",
        from = "Column::PickingId",
        to = "super::stock_picking::Column::Id"
    )]
    StockPicking,
    #[sea_orm(
        belongs_to = "super::stock_lot::Entity",
        from = "Column::LotId",
        to = "super::stock_lot::Column::Id"
    )]
    StockLot,
    #[sea_orm(
        belongs_to = "super::production_order::Entity",
        from = "Column::ProductionOrderId",
        to = "super::production_order::Column::Id"
    )]
    ProductionOrder,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::stock_picking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockPicking.def()
    }
}

impl Related<super::stock_lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockLot.def()
    }
}

impl Related<super::production_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
