use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::Display;

/// What a location is used for. Balance direction is derived from the
/// usage of the two sides of a move (see `ledger::Flow`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum LocationUsage {
    /// Company-owned storage
    #[sea_orm(string_value = "internal")]
    Internal,
    #[sea_orm(string_value = "supplier")]
    Supplier,
    #[sea_orm(string_value = "customer")]
    Customer,
    /// Shop-floor / production input-output
    #[sea_orm(string_value = "production")]
    Production,
    #[sea_orm(string_value = "scrap")]
    Scrap,
}

impl LocationUsage {
    pub fn is_internal(self) -> bool {
        matches!(self, LocationUsage::Internal)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_locations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub usage: LocationUsage,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
