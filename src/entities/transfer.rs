use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of an inter-base transfer.
///
/// `Pending` is entered at initiation together with the source debit that
/// reserves the stock. Both other states are terminal: `Completed` credits
/// the destination, `Cancelled` refunds the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Completed,
    Cancelled,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Completed => "completed",
            TransferStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransferStatus::Pending),
            "completed" => Some(TransferStatus::Completed),
            "cancelled" => Some(TransferStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransferStatus::Pending)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub from_base_id: Uuid,
    pub to_base_id: Uuid,
    pub equipment_type_id: Uuid,
    pub quantity: i64,
    /// Storing as string in DB, converted to/from `TransferStatus`
    pub status: String,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn status(&self) -> Option<TransferStatus> {
        TransferStatus::parse(&self.status)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::base::Entity",
        from = "Column::FromBaseId",
        to = "super::base::Column::Id"
    )]
    FromBase,
    #[sea_orm(
        belongs_to = "super::base::Entity",
        from = "Column::ToBaseId",
        to = "super::base::Column::Id"
    )]
    ToBase,
    #[sea_orm(
        belongs_to = "super::equipment_type::Entity",
        from = "Column::EquipmentTypeId",
        to = "super::equipment_type::Column::Id"
    )]
    EquipmentType,
}

impl Related<super::equipment_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EquipmentType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
