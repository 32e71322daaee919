use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionError,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::{AuditEntry, AuditSink},
    auth::policy::{self, Actor, TransferDecision},
    entities::transfer::{self, Entity as Transfers, TransferStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    metrics::{LEDGER_FAILURES, LEDGER_OPERATIONS},
    queries::RecordFilter,
    services::inventory,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InitiateTransferCommand {
    pub from_base_id: Uuid,
    pub to_base_id: Uuid,
    pub equipment_type_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i64,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Service for moving stock between bases.
///
/// Transfers are two-phase: initiation debits the source immediately
/// (reserving the stock), and the pending record is later completed with a
/// destination credit or cancelled with a source refund.
#[derive(Clone)]
pub struct TransferService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
    audit: Arc<dyn AuditSink>,
}

impl TransferService {
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

    /// Debits the source base and creates the pending transfer, both in one
    /// transaction. After this returns, reads of the source balance already
    /// see the reduced figure even though the goods have not moved yet.
    #[instrument(skip(self, actor, command))]
    pub async fn initiate_transfer(
        &self,
        actor: &Actor,
        command: InitiateTransferCommand,
    ) -> Result<transfer::Model, ServiceError> {
        command.validate().map_err(|e| {
            LEDGER_FAILURES
                .with_label_values(&["transfer_initiate", "validation_error"])
                .inc();
            let msg = format!("Invalid input: {}", e);
            error!("{}", msg);
            ServiceError::InvalidInput(msg)
        })?;

        if command.from_base_id == command.to_base_id {
            LEDGER_FAILURES
                .with_label_values(&["transfer_initiate", "validation_error"])
                .inc();
            return Err(ServiceError::InvalidInput(
                "Cannot transfer to the same base".to_string(),
            ));
        }

        policy::ensure_can_operate_on_base(actor, command.from_base_id).map_err(|e| {
            LEDGER_FAILURES
                .with_label_values(&["transfer_initiate", "access_denied"])
                .inc();
            e
        })?;

        let created_by = actor.user_id;
        let cmd = command.clone();
        let db = self.db_pool.as_ref();

        let (record, balance) = db
            .transaction::<_, (transfer::Model, crate::entities::inventory_balance::Model), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        // The debit is the reservation: once it commits, no other
                        // transfer or assignment can claim the same units.
                        let balance = inventory::debit_balance(
                            txn,
                            cmd.from_base_id,
                            cmd.equipment_type_id,
                            cmd.quantity,
                        )
                        .await?;

                        let row = transfer::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            from_base_id: Set(cmd.from_base_id),
                            to_base_id: Set(cmd.to_base_id),
                            equipment_type_id: Set(cmd.equipment_type_id),
                            quantity: Set(cmd.quantity),
                            status: Set(TransferStatus::Pending.as_str().to_string()),
                            notes: Set(cmd.notes.clone()),
                            created_by: Set(created_by),
                            created_at: Set(Utc::now()),
                            updated_at: Set(None),
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
                    .with_label_values(&["transfer_initiate", label])
                    .inc();
                err
            })?;

        LEDGER_OPERATIONS
            .with_label_values(&["transfer_initiate"])
            .inc();

        info!(
            transfer_id = %record.id,
            from_base_id = %record.from_base_id,
            to_base_id = %record.to_base_id,
            equipment_type_id = %record.equipment_type_id,
            quantity = %record.quantity,
            source_balance = %balance.current_balance,
            "Transfer initiated"
        );

        if let Err(e) = self
            .event_sender
            .send(Event::TransferInitiated {
                transfer_id: record.id,
                from_base_id: record.from_base_id,
                to_base_id: record.to_base_id,
                equipment_type_id: record.equipment_type_id,
                quantity: record.quantity,
            })
            .await
        {
            warn!("Failed to send transfer event: {}", e);
        }

        self.audit
            .record(
                AuditEntry::new(actor.user_id, "TRANSFER_INIT", "TRANSFER")
                    .entity_id(record.id)
                    .old_values(json!({
                        "source_balance": balance.current_balance + record.quantity
                    }))
                    .new_values(json!({
                        "transfer": &record,
                        "source_balance": balance.current_balance
                    })),
            )
            .await;

        Ok(record)
    }

    /// Finalizes a pending transfer.
    ///
    /// Completion credits the destination; cancellation refunds the source.
    /// Either way the status transition and the credit commit atomically: a
    /// crash before commit leaves the transfer pending and retry-safe.
    #[instrument(skip(self, actor))]
    pub async fn finalize_transfer(
        &self,
        actor: &Actor,
        transfer_id: Uuid,
        decision: TransferDecision,
    ) -> Result<transfer::Model, ServiceError> {
        let op_label = match decision {
            TransferDecision::Complete => "transfer_complete",
            TransferDecision::Cancel => "transfer_cancel",
        };

        let actor = *actor;
        let db = self.db_pool.as_ref();

        let (record, previous) = db
            .transaction::<_, (transfer::Model, transfer::Model), ServiceError>(move |txn| {
                Box::pin(async move {
                    // Hold the transfer row exclusively to serialize competing
                    // finalization attempts.
                    let existing = locked_transfer(txn, transfer_id)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Transfer {} not found", transfer_id))
                        })?;

                    match existing.status() {
                        Some(TransferStatus::Pending) => {}
                        Some(_) => {
                            return Err(ServiceError::InvalidStatus(
                                "Transfer is not pending".to_string(),
                            ));
                        }
                        None => {
                            return Err(ServiceError::InternalError(format!(
                                "Transfer {} has unrecognized status '{}'",
                                existing.id, existing.status
                            )));
                        }
                    }

                    // Authorization comes after the read but before any mutation
                    policy::ensure_can_finalize_transfer(
                        &actor,
                        existing.from_base_id,
                        existing.to_base_id,
                        decision,
                    )?;

                    let new_status = match decision {
                        TransferDecision::Complete => TransferStatus::Completed,
                        TransferDecision::Cancel => TransferStatus::Cancelled,
                    };

                    // Guarded transition: only moves the row out of pending if it
                    // is still pending, so a racing finalizer cannot double-credit.
                    let result = Transfers::update_many()
                        .col_expr(
                            transfer::Column::Status,
                            Expr::value(new_status.as_str()),
                        )
                        .col_expr(transfer::Column::UpdatedAt, Expr::value(Some(Utc::now())))
                        .filter(transfer::Column::Id.eq(transfer_id))
                        .filter(
                            transfer::Column::Status.eq(TransferStatus::Pending.as_str()),
                        )
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    if result.rows_affected == 0 {
                        return Err(ServiceError::InvalidStatus(
                            "Transfer is not pending".to_string(),
                        ));
                    }

                    match decision {
                        TransferDecision::Complete => {
                            inventory::credit_balance(
                                txn,
                                existing.to_base_id,
                                existing.equipment_type_id,
                                existing.quantity,
                            )
                            .await?;
                        }
                        TransferDecision::Cancel => {
                            inventory::credit_balance(
                                txn,
                                existing.from_base_id,
                                existing.equipment_type_id,
                                existing.quantity,
                            )
                            .await?;
                        }
                    }

                    let updated = Transfers::find_by_id(transfer_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::InternalError(
                                "Transfer row vanished during finalization".to_string(),
                            )
                        })?;

                    Ok((updated, existing))
                })
            })
            .await
            .map_err(|e| {
                let err = match e {
                    TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                    TransactionError::Transaction(service_err) => service_err,
                };
                let label = match &err {
                    ServiceError::NotFound(_) => "not_found",
                    ServiceError::InvalidStatus(_) => "invalid_status",
                    ServiceError::Forbidden(_) => "access_denied",
                    _ => "database_error",
                };
                LEDGER_FAILURES.with_label_values(&[op_label, label]).inc();
                err
            })?;

        LEDGER_OPERATIONS.with_label_values(&[op_label]).inc();

        info!(
            transfer_id = %record.id,
            status = %record.status,
            quantity = %record.quantity,
            "Transfer finalized"
        );

        let event = match decision {
            TransferDecision::Complete => Event::TransferCompleted {
                transfer_id: record.id,
                to_base_id: record.to_base_id,
                equipment_type_id: record.equipment_type_id,
                quantity: record.quantity,
            },
            TransferDecision::Cancel => Event::TransferCancelled {
                transfer_id: record.id,
                from_base_id: record.from_base_id,
                equipment_type_id: record.equipment_type_id,
                quantity: record.quantity,
            },
        };
        if let Err(e) = self.event_sender.send(event).await {
            warn!("Failed to send transfer event: {}", e);
        }

        let action = match decision {
            TransferDecision::Complete => "TRANSFER_COMPLETED",
            TransferDecision::Cancel => "TRANSFER_CANCELLED",
        };
        self.audit
            .record(
                AuditEntry::new(actor.user_id, action, "TRANSFER")
                    .entity_id(record.id)
                    .old_values(json!(&previous))
                    .new_values(json!(&record)),
            )
            .await;

        Ok(record)
    }

    /// Fetches one transfer, applying the actor's visibility rules
    #[instrument(skip(self, actor))]
    pub async fn get_transfer(
        &self,
        actor: &Actor,
        transfer_id: Uuid,
    ) -> Result<transfer::Model, ServiceError> {
        let record = Transfers::find_by_id(transfer_id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Transfer {} not found", transfer_id))
            })?;

        if !actor.role.is_global()
            && actor.base_id != Some(record.from_base_id)
            && actor.base_id != Some(record.to_base_id)
        {
            return Err(ServiceError::Forbidden(
                "Access denied to this transfer".to_string(),
            ));
        }

        Ok(record)
    }

    /// Lists transfers where the actor's base is either endpoint, newest first
    #[instrument(skip(self, actor))]
    pub async fn list_transfers(
        &self,
        actor: &Actor,
        filter: &RecordFilter,
    ) -> Result<Vec<transfer::Model>, ServiceError> {
        let condition = filter.to_transfer_condition(
            actor,
            transfer::Column::FromBaseId,
            transfer::Column::ToBaseId,
            transfer::Column::EquipmentTypeId,
            transfer::Column::CreatedAt,
        );

        Transfers::find()
            .filter(condition)
            .order_by_desc(transfer::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }
}

/// Transfer lookup with an exclusive row hold where the backend supports it.
async fn locked_transfer(
    txn: &DatabaseTransaction,
    transfer_id: Uuid,
) -> Result<Option<transfer::Model>, ServiceError> {
    let mut query = Transfers::find().filter(transfer::Column::Id.eq(transfer_id));

    if txn.get_database_backend() == DbBackend::Postgres {
        query = query.lock_exclusive();
    }

    query.one(txn).await.map_err(ServiceError::db_error)
}
