use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fixed 8-hour shift patterns: A 06-14, B 14-22, C 22-06.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(1))")]
pub enum ShiftCode {
    #[sea_orm(string_value = "A")]
    A,
    #[sea_orm(string_value = "B")]
    B,
    #[sea_orm(string_value = "C")]
    C,
}

impl ShiftCode {
    pub fn start_hour(self) -> u32 {
        match self {
            ShiftCode::A => 6,
            ShiftCode::B => 14,
            ShiftCode::C => 22,
        }
    }

    pub const DURATION_HOURS: u32 = 8;

    /// The 8 hour-slot keys covered by this shift, `"06-07"` style.
    pub fn hour_slots(self) -> Vec<String> {
        let start = self.start_hour();
        (0..Self::DURATION_HOURS)
            .map(|i| {
                let hour = (start + i) % 24;
                let next = (hour + 1) % 24;
                format!("{hour:02}-{next:02}")
            })
            .collect()
    }
}

/// One recorded shift at a work center
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work_center_shifts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub work_center_id: Uuid,
    pub date: Date,
    pub code: ShiftCode,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub target_qty: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub produced_qty: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub rejected_qty: Decimal,
    pub operator: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::work_center::Entity",
        from = "Column::WorkCenterId",
        to = "super::work_center::Column::Id"
    )]
    WorkCenter,
}

impl Related<super::work_center::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkCenter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
