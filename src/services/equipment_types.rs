use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::{AuditEntry, AuditSink},
    auth::policy::Actor,
    entities::equipment_type::{self, Entity as EquipmentTypes},
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEquipmentTypeCommand {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "Category is required"))]
    pub category: String,
    #[validate(length(min = 1, max = 50, message = "Unit is required"))]
    pub unit: String,
}

/// Catalog of equipment types. Created once, rarely mutated.
#[derive(Clone)]
pub struct EquipmentTypeService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
    audit: Arc<dyn AuditSink>,
}

impl EquipmentTypeService {
    pub fn new(
        db_pool: Arc<DatabaseConnection>,
        event_sender: EventSender,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            audit,
        }
    }

    #[instrument(skip(self, actor, command))]
    pub async fn create_equipment_type(
        &self,
        actor: &Actor,
        command: CreateEquipmentTypeCommand,
    ) -> Result<equipment_type::Model, ServiceError> {
        command
            .validate()
            .map_err(|e| ServiceError::InvalidInput(format!("Invalid input: {}", e)))?;

        let row = equipment_type::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(command.name),
            category: Set(command.category),
            unit: Set(command.unit),
            created_at: Set(Utc::now()),
        };
        let created = row
            .insert(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        info!(
            equipment_type_id = %created.id,
            name = %created.name,
            "Equipment type created"
        );

        if let Err(e) = self
            .event_sender
            .send(Event::EquipmentTypeCreated(created.id))
            .await
        {
            warn!("Failed to send equipment type event: {}", e);
        }
        self.audit
            .record(
                AuditEntry::new(actor.user_id, "CREATE", "EQUIPMENT_TYPE")
                    .entity_id(created.id)
                    .new_values(json!(&created)),
            )
            .await;

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_equipment_type(
        &self,
        equipment_type_id: Uuid,
    ) -> Result<equipment_type::Model, ServiceError> {
        EquipmentTypes::find_by_id(equipment_type_id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Equipment type {} not found",
                    equipment_type_id
                ))
            })
    }

    #[instrument(skip(self))]
    pub async fn list_equipment_types(
        &self,
    ) -> Result<Vec<equipment_type::Model>, ServiceError> {
        EquipmentTypes::find()
            .order_by_asc(equipment_type::Column::Name)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }
}
