use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Downtime reason catalogue used by the shop floor.
/// Iterate the catalogue via `sea_orm::Iterable`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum DowntimeReason {
    #[sea_orm(string_value = "no_machine_mould_change")]
    NoMachineMouldChange,
    #[sea_orm(string_value = "mould_change_problem")]
    MouldChangeProblem,
    #[sea_orm(string_value = "water_problem")]
    WaterProblem,
    #[sea_orm(string_value = "interior_quality_problem")]
    InteriorQualityProblem,
    #[sea_orm(string_value = "no_raw_material")]
    NoRawMaterial,
    #[sea_orm(string_value = "no_operator")]
    NoOperator,
    #[sea_orm(string_value = "no_power")]
    NoPower,
    #[sea_orm(string_value = "mould_change")]
    MouldChange,
    #[sea_orm(string_value = "barrel_clean")]
    BarrelClean,
    #[sea_orm(string_value = "hand_processing_problem")]
    HandProcessingProblem,
    #[sea_orm(string_value = "insert_change")]
    InsertChange,
    #[sea_orm(string_value = "mould_service")]
    MouldService,
    #[sea_orm(string_value = "machine_service")]
    MachineService,
    #[sea_orm(string_value = "mould_production_setting")]
    MouldProductionSetting,
    #[sea_orm(string_value = "no_production_plan")]
    NoProductionPlan,
    #[sea_orm(string_value = "other")]
    Other,
}

/// One downtime interval at a work center
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "downtime_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub work_center_id: Uuid,
    pub shift_id: Option<Uuid>,
    pub reason: DowntimeReason,
    pub started_at: DateTimeUtc,
    pub ended_at: DateTimeUtc,
    pub note: Option<String>,
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Interval length in whole-second-accurate minutes.
    pub fn minutes(&self) -> f64 {
        let secs = self
            .ended_at
            .signed_duration_since(self.started_at)
            .num_seconds();
        secs.max(0) as f64 / 60.0
    }
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
