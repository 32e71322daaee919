use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::{AuditEntry, AuditSink},
    auth::policy::{self, Actor},
    entities::{
        base::Entity as Bases,
        equipment_type::Entity as EquipmentTypes,
        purchase::{self, Entity as Purchases},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    metrics::{LEDGER_FAILURES, LEDGER_OPERATIONS},
    queries::RecordFilter,
    services::inventory,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordPurchaseCommand {
    pub base_id: Uuid,
    pub equipment_type_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i64,
    #[validate(length(max = 200))]
    pub supplier: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Service for recording procurement and crediting stock
#[derive(Clone)]
pub struct PurchaseService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
    audit: Arc<dyn AuditSink>,
}

impl PurchaseService {
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

    /// Records a purchase and credits the receiving base's balance, both in
    /// one transaction.
    #[instrument(skip(self, actor, command))]
    pub async fn record_purchase(
        &self,
        actor: &Actor,
        command: RecordPurchaseCommand,
    ) -> Result<purchase::Model, ServiceError> {
        command.validate().map_err(|e| {
            LEDGER_FAILURES
                .with_label_values(&["purchase", "validation_error"])
                .inc();
            let msg = format!("Invalid input: {}", e);
            error!("{}", msg);
            ServiceError::InvalidInput(msg)
        })?;

        policy::ensure_can_operate_on_base(actor, command.base_id).map_err(|e| {
            LEDGER_FAILURES
                .with_label_values(&["purchase", "access_denied"])
                .inc();
            e
        })?;

        let db = self.db_pool.as_ref();

        // Referential checks happen before the transaction starts
        if Bases::find_by_id(command.base_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .is_none()
        {
            LEDGER_FAILURES
                .with_label_values(&["purchase", "invalid_input"])
                .inc();
            return Err(ServiceError::InvalidInput(format!(
                "Base {} does not exist",
                command.base_id
            )));
        }
        if EquipmentTypes::find_by_id(command.equipment_type_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .is_none()
        {
            LEDGER_FAILURES
                .with_label_values(&["purchase", "invalid_input"])
                .inc();
            return Err(ServiceError::InvalidInput(format!(
                "Equipment type {} does not exist",
                command.equipment_type_id
            )));
        }

        let created_by = actor.user_id;
        let cmd = command.clone();
        let (purchase, balance) = db
            .transaction::<_, (purchase::Model, crate::entities::inventory_balance::Model), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let row = purchase::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            base_id: Set(cmd.base_id),
                            equipment_type_id: Set(cmd.equipment_type_id),
                            quantity: Set(cmd.quantity),
                            supplier: Set(cmd.supplier.clone()),
                            purchase_date: Set(cmd.purchase_date.unwrap_or_else(Utc::now)),
                            notes: Set(cmd.notes.clone()),
                            created_by: Set(created_by),
                            created_at: Set(Utc::now()),
                        };
                        let purchase = row.insert(txn).await.map_err(ServiceError::db_error)?;

                        let balance = inventory::credit_balance(
                            txn,
                            cmd.base_id,
                            cmd.equipment_type_id,
                            cmd.quantity,
                        )
                        .await?;

                        Ok((purchase, balance))
                    })
                },
            )
            .await
            .map_err(|e| {
                let err = match e {
                    TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                    TransactionError::Transaction(service_err) => service_err,
                };
                LEDGER_FAILURES
                    .with_label_values(&["purchase", "database_error"])
                    .inc();
                err
            })?;

        LEDGER_OPERATIONS.with_label_values(&["purchase"]).inc();

        info!(
            purchase_id = %purchase.id,
            base_id = %purchase.base_id,
            equipment_type_id = %purchase.equipment_type_id,
            quantity = %purchase.quantity,
            new_balance = %balance.current_balance,
            "Purchase recorded"
        );

        // Domain event and audit trail are best-effort; the ledger write has
        // already committed.
        if let Err(e) = self
            .event_sender
            .send(Event::PurchaseRecorded {
                purchase_id: purchase.id,
                base_id: purchase.base_id,
                equipment_type_id: purchase.equipment_type_id,
                quantity: purchase.quantity,
            })
            .await
        {
            warn!("Failed to send purchase event: {}", e);
        }

        self.audit
            .record(
                AuditEntry::new(actor.user_id, "PURCHASE", "PURCHASE")
                    .entity_id(purchase.id)
                    .old_values(json!({
                        "current_balance": balance.current_balance - purchase.quantity
                    }))
                    .new_values(json!({
                        "purchase": &purchase,
                        "current_balance": balance.current_balance
                    })),
            )
            .await;

        Ok(purchase)
    }

    /// Lists purchases visible to the actor, newest first
    #[instrument(skip(self, actor))]
    pub async fn list_purchases(
        &self,
        actor: &Actor,
        filter: &RecordFilter,
    ) -> Result<Vec<purchase::Model>, ServiceError> {
        let condition = filter.to_condition(
            actor,
            purchase::Column::BaseId,
            purchase::Column::EquipmentTypeId,
            purchase::Column::PurchaseDate,
        );

        Purchases::find()
            .filter(condition)
            .order_by_desc(purchase::Column::PurchaseDate)
            .order_by_desc(purchase::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }
}
