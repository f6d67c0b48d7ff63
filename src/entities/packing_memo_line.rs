use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "packing_memo_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub memo_id: Uuid,
    pub product_id: Uuid,
    pub lot_id: Uuid,
    /// Quantity ordered on the delivery
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    /// Quantity actually packed from the lot
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub selected_qty: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::packing_memo::Entity",
        from = "Column::MemoId",
        to = "super::packing_memo::Column::Id"
    )]
    PackingMemo,
}

impl Related<super::packing_memo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PackingMemo.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
