use chrono::Utc;
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
    entities::assignment::{self, AssignmentKind, Entity as Assignments},
    errors::ServiceError,
    events::{Event, EventSender},
    metrics::{LEDGER_FAILURES, LEDGER_OPERATIONS},
    queries::RecordFilter,
    services::inventory,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordAssignmentCommand {
    pub base_id: Uuid,
    pub equipment_type_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i64,
    pub kind: AssignmentKind,
    #[validate(length(max = 200))]
    pub assigned_to: Option<String>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Service for issuing stock to personnel or writing it off as expended
#[derive(Clone)]
pub struct AssignmentService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
    audit: Arc<dyn AuditSink>,
}

impl AssignmentService {
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

    /// Debits the base's balance and records the assignment, both in one
    /// transaction. The debit holds the balance row exclusively, so two
    /// concurrent assignments can never both spend the same stock.
    #[instrument(skip(self, actor, command))]
    pub async fn record_assignment(
        &self,
        actor: &Actor,
        command: RecordAssignmentCommand,
    ) -> Result<assignment::Model, ServiceError> {
        command.validate().map_err(|e| {
            LEDGER_FAILURES
                .with_label_values(&["assignment", "validation_error"])
                .inc();
            let msg = format!("Invalid input: {}", e);
            error!("{}", msg);
            ServiceError::InvalidInput(msg)
        })?;

        policy::ensure_can_operate_on_base(actor, command.base_id).map_err(|e| {
            LEDGER_FAILURES
                .with_label_values(&["assignment", "access_denied"])
                .inc();
            e
        })?;

        let created_by = actor.user_id;
        let cmd = command.clone();
        let db = self.db_pool.as_ref();

        let (record, balance) = db
            .transaction::<_, (assignment::Model, crate::entities::inventory_balance::Model), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        // Debit first: the guarded decrement is what serializes
                        // competing spenders of this (base, equipment type) pair.
                        let balance = inventory::debit_balance(
                            txn,
                            cmd.base_id,
                            cmd.equipment_type_id,
                            cmd.quantity,
                        )
                        .await?;

                        let row = assignment::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            base_id: Set(cmd.base_id),
                            equipment_type_id: Set(cmd.equipment_type_id),
                            assigned_to: Set(cmd.assigned_to.clone()),
                            quantity: Set(cmd.quantity),
                            kind: Set(cmd.kind.as_str().to_string()),
                            notes: Set(cmd.notes.clone()),
                            created_by: Set(created_by),
                            created_at: Set(Utc::now()),
                        };
                        let record = row.insert(txn).await.map_err(ServiceError::db_error)?;

                        Ok((record, balance))
                    })
                },
            )
            .await
            .map_err(|e| {
                let err = match e {
                    TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                    TransactionError::Transaction(service_err) => service_err,
                };
                let label = match &err {
                    ServiceError::InsufficientInventory(_) => "insufficient_inventory",
                    _ => "database_error",
                };
                LEDGER_FAILURES
                    .with_label_values(&["assignment", label])
                    .inc();
                err
            })?;

        LEDGER_OPERATIONS.with_label_values(&["assignment"]).inc();

        info!(
            assignment_id = %record.id,
            base_id = %record.base_id,
            equipment_type_id = %record.equipment_type_id,
            quantity = %record.quantity,
            kind = %record.kind,
            new_balance = %balance.current_balance,
            "Assignment recorded"
        );

        if let Err(e) = self
            .event_sender
            .send(Event::AssignmentRecorded {
                assignment_id: record.id,
                base_id: record.base_id,
                equipment_type_id: record.equipment_type_id,
                quantity: record.quantity,
                kind: record.kind.clone(),
            })
            .await
        {
            warn!("Failed to send assignment event: {}", e);
        }

        let action = match command.kind {
            AssignmentKind::Assigned => "ASSET_ASSIGNED",
            AssignmentKind::Expended => "ASSET_EXPENDED",
        };
        self.audit
            .record(
                AuditEntry::new(actor.user_id, action, "ASSIGNMENT")
                    .entity_id(record.id)
                    .old_values(json!({
                        "current_balance": balance.current_balance + record.quantity
                    }))
                    .new_values(json!({
                        "assignment": &record,
                        "current_balance": balance.current_balance
                    })),
            )
            .await;

        Ok(record)
    }

    /// Lists assignments visible to the actor, newest first
    #[instrument(skip(self, actor))]
    pub async fn list_assignments(
        &self,
        actor: &Actor,
        filter: &RecordFilter,
    ) -> Result<Vec<assignment::Model>, ServiceError> {
        let condition = filter.to_condition(
            actor,
            assignment::Column::BaseId,
            assignment::Column::EquipmentTypeId,
            assignment::Column::CreatedAt,
        );

        Assignments::find()
            .filter(condition)
            .order_by_desc(assignment::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }
}
