use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
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
    entities::{
        base::{self, Entity as Bases},
        inventory_balance::{self, Entity as InventoryBalance},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBaseCommand {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 200, message = "Location is required"))]
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateBaseCommand {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub location: Option<String>,
}

/// Administration of bases. Mutations are admin-only, enforced at the
/// routing layer.
#[derive(Clone)]
pub struct BaseService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
    audit: Arc<dyn AuditSink>,
}

impl BaseService {
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
    pub async fn create_base(
        &self,
        actor: &Actor,
        command: CreateBaseCommand,
    ) -> Result<base::Model, ServiceError> {
        command
            .validate()
            .map_err(|e| ServiceError::InvalidInput(format!("Invalid input: {}", e)))?;

        let row = base::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(command.name),
            location: Set(command.location),
            created_at: Set(Utc::now()),
        };
        let created = row
            .insert(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        info!(base_id = %created.id, name = %created.name, "Base created");

        if let Err(e) = self.event_sender.send(Event::BaseCreated(created.id)).await {
            warn!("Failed to send base event: {}", e);
        }
        self.audit
            .record(
                AuditEntry::new(actor.user_id, "CREATE", "BASE")
                    .entity_id(created.id)
                    .new_values(json!(&created)),
            )
            .await;

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_base(&self, base_id: Uuid) -> Result<base::Model, ServiceError> {
        Bases::find_by_id(base_id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Base {} not found", base_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_bases(&self) -> Result<Vec<base::Model>, ServiceError> {
        Bases::find()
            .order_by_asc(base::Column::Name)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self, actor, command))]
    pub async fn update_base(
        &self,
        actor: &Actor,
        base_id: Uuid,
        command: UpdateBaseCommand,
    ) -> Result<base::Model, ServiceError> {
        command
            .validate()
            .map_err(|e| ServiceError::InvalidInput(format!("Invalid input: {}", e)))?;

        let existing = self.get_base(base_id).await?;

        let mut active: base::ActiveModel = existing.clone().into();
        if let Some(name) = command.name {
            active.name = Set(name);
        }
        if let Some(location) = command.location {
            active.location = Set(location);
        }
        let updated = active
            .update(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        info!(base_id = %updated.id, "Base updated");

        if let Err(e) = self.event_sender.send(Event::BaseUpdated(updated.id)).await {
            warn!("Failed to send base event: {}", e);
        }
        self.audit
            .record(
                AuditEntry::new(actor.user_id, "UPDATE", "BASE")
                    .entity_id(updated.id)
                    .old_values(json!(&existing))
                    .new_values(json!(&updated)),
            )
            .await;

        Ok(updated)
    }

    /// Deletes a base. Refused while inventory is still held there; zeroed
    /// balance rows do not block deletion.
    #[instrument(skip(self, actor))]
    pub async fn delete_base(&self, actor: &Actor, base_id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_base(base_id).await?;

        let held = InventoryBalance::find()
            .filter(inventory_balance::Column::BaseId.eq(base_id))
            .filter(inventory_balance::Column::CurrentBalance.gt(0))
            .count(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        if held > 0 {
            return Err(ServiceError::InvalidInput(
                "Base still holds inventory; transfer or expend it first".to_string(),
            ));
        }

        existing
            .clone()
            .delete(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        info!(base_id = %base_id, "Base deleted");

        if let Err(e) = self.event_sender.send(Event::BaseDeleted(base_id)).await {
            warn!("Failed to send base event: {}", e);
        }
        self.audit
            .record(
                AuditEntry::new(actor.user_id, "DELETE", "BASE")
                    .entity_id(base_id)
                    .old_values(json!(&existing)),
            )
            .await;

        Ok(())
    }
}
