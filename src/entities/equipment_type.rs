use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "equipment_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    /// Broad grouping used by reporting, e.g. "weapon", "vehicle", "ammunition"
    pub category: String,
    /// Unit of measure, e.g. "each", "rounds", "litres"
    pub unit: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::inventory_balance::Entity")]
    InventoryBalance,
}

impl Related<super::inventory_balance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryBalance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
