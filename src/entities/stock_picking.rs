use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PickingKind {
    #[sea_orm(string_value = "incoming")]
    Incoming,
    #[sea_orm(string_value = "outgoing")]
    Outgoing,
    #[sea_orm(string_value = "internal")]
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PickingState {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "done")]
    Done,
    #[sea_orm(string_value = "cancel")]
    Cancel,
}

/// Transfer document grouping stock moves. `name` doubles as the
/// packing-slip number on outgoing pickings.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_pickings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub kind: PickingKind,
    pub state: PickingState,
    pub partner_id: Option<Uuid>,
    pub party_id: Option<Uuid>,
    pub scheduled_date: Option<DateTimeUtc>,
    pub date_done: Option<DateTimeUtc>,
    /// Originating document (sale order, W.O number)
    pub origin: Option<String>,
    pub invoice_number: Option<String>,
    /// Assigned once on first finalize, immutable afterwards
    pub internal_batch_number: Option<String>,
    pub supplier_batch_number: Option<String>,
    /// Melt-flow index recorded at receipt
    pub mfi_value: Option<f64>,
    pub number_of_bags: Option<i32>,
    pub remarks: Option<String>,
    pub delay_acknowledged: bool,
    pub delay_reason: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_move::Entity")]
    StockMove,
    #[sea_orm(
        belongs_to = "super::partner::Entity",
        from = "Column::PartnerId",
        to = "super::partner::Column::Id"
    )]
    Partner,
}

impl Related<super::stock_move::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockMove.def()
    }
}

impl Related<super::partner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Partner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
