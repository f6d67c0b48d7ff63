use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Packing memo header. `name` is sequence-generated (`PM<yy><nnnn>`).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "packing_memos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub picking_id: Uuid,
    /// Originating sale order reference
    pub sale_origin: Option<String>,
    pub partner_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::packing_memo_line::Entity")]
    Line,
    #[sea_orm(
        belongs_to = "super::stock_picking::Entity",
        from = "Column::PickingId",
        to = "super::stock_picking::Column::Id"
    )]
    StockPicking,
}

impl Related<super::packing_memo_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Line.def()
    }
}

impl Related<super::stock_picking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockPicking.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
