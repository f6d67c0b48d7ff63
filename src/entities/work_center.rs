use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Machine / work center
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work_centers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub hourly_capacity: Option<Decimal>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::work_center_shift::Entity")]
    Shift,
    #[sea_orm(has_many = "super::downtime_entry::Entity")]
    Downtime,
}

impl Related<super::work_center_shift::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shift.def()
    }
}

impl Related<super::downtime_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Downtime.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
