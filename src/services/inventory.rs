use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::policy::Actor,
    entities::inventory_balance::{self, Entity as InventoryBalance},
    errors::ServiceError,
    queries::RecordFilter,
};

/// Read surface over the balance store.
///
/// Mutations never go through this service; they happen inside the ledger
/// operations via the transaction-scoped primitives below. Reads here are
/// snapshot reads and may be stale relative to in-flight transactions, which
/// is acceptable for reporting but never for mutation decisions.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DatabaseConnection>,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self { db_pool }
    }

    /// Snapshot of one balance row
    #[instrument(skip(self))]
    pub async fn get_balance(
        &self,
        base_id: Uuid,
        equipment_type_id: Uuid,
    ) -> Result<Option<inventory_balance::Model>, ServiceError> {
        find_balance(self.db_pool.as_ref(), base_id, equipment_type_id).await
    }

    /// Snapshot listing, scoped by the actor's visibility
    #[instrument(skip(self, actor))]
    pub async fn list_balances(
        &self,
        actor: &Actor,
        filter: &RecordFilter,
    ) -> Result<Vec<inventory_balance::Model>, ServiceError> {
        let condition = filter.to_condition(
            actor,
            inventory_balance::Column::BaseId,
            inventory_balance::Column::EquipmentTypeId,
            inventory_balance::Column::LastUpdated,
        );

        InventoryBalance::find()
            .filter(condition)
            .order_by_asc(inventory_balance::Column::BaseId)
            .order_by_asc(inventory_balance::Column::EquipmentTypeId)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }
}

/// Unlocked balance lookup usable on a connection or inside a transaction.
pub(crate) async fn find_balance<C: ConnectionTrait>(
    conn: &C,
    base_id: Uuid,
    equipment_type_id: Uuid,
) -> Result<Option<inventory_balance::Model>, ServiceError> {
    InventoryBalance::find()
        .filter(inventory_balance::Column::BaseId.eq(base_id))
        .filter(inventory_balance::Column::EquipmentTypeId.eq(equipment_type_id))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)
}

/// Balance lookup with an exclusive row hold, for use inside a ledger
/// transaction only. On Postgres this is `SELECT ... FOR UPDATE`; SQLite has
/// no row locks, so there the hold is provided by its single-writer model
/// together with the guarded updates below.
pub(crate) async fn locked_balance(
    txn: &DatabaseTransaction,
    base_id: Uuid,
    equipment_type_id: Uuid,
) -> Result<Option<inventory_balance::Model>, ServiceError> {
    let mut query = InventoryBalance::find()
        .filter(inventory_balance::Column::BaseId.eq(base_id))
        .filter(inventory_balance::Column::EquipmentTypeId.eq(equipment_type_id));

    if txn.get_database_backend() == DbBackend::Postgres {
        query = query.lock_exclusive();
    }

    query.one(txn).await.map_err(ServiceError::db_error)
}

/// Credit a balance inside a ledger transaction, creating the row lazily on
/// first credit to a (base, equipment type) pair.
pub(crate) async fn credit_balance(
    txn: &DatabaseTransaction,
    base_id: Uuid,
    equipment_type_id: Uuid,
    quantity: i64,
) -> Result<inventory_balance::Model, ServiceError> {
    debug_assert!(quantity > 0);

    match locked_balance(txn, base_id, equipment_type_id).await? {
        Some(existing) => {
            let mut active: inventory_balance::ActiveModel = existing.clone().into();
            active.current_balance = Set(existing.current_balance + quantity);
            active.last_updated = Set(Utc::now());
            active.update(txn).await.map_err(ServiceError::db_error)
        }
        None => {
            let row = inventory_balance::ActiveModel {
                id: Set(Uuid::new_v4()),
                base_id: Set(base_id),
                equipment_type_id: Set(equipment_type_id),
                current_balance: Set(quantity),
                last_updated: Set(Utc::now()),
            };
            row.insert(txn).await.map_err(ServiceError::db_error)
        }
    }
}

/// Debit a balance inside a ledger transaction.
///
/// The decrement is a single guarded statement: it only applies while the
/// row still holds at least `quantity`, so the balance can never go negative
/// even if a competing debit slipped in between the caller's read and this
/// write. Zero rows affected means the stock is gone (or the row never
/// existed) and surfaces as `InsufficientInventory`.
pub(crate) async fn debit_balance(
    txn: &DatabaseTransaction,
    base_id: Uuid,
    equipment_type_id: Uuid,
    quantity: i64,
) -> Result<inventory_balance::Model, ServiceError> {
    debug_assert!(quantity > 0);

    let result = InventoryBalance::update_many()
        .col_expr(
            inventory_balance::Column::CurrentBalance,
            Expr::col(inventory_balance::Column::CurrentBalance).sub(quantity),
        )
        .col_expr(
            inventory_balance::Column::LastUpdated,
            Expr::value(Utc::now()),
        )
        .filter(inventory_balance::Column::BaseId.eq(base_id))
        .filter(inventory_balance::Column::EquipmentTypeId.eq(equipment_type_id))
        .filter(inventory_balance::Column::CurrentBalance.gte(quantity))
        .exec(txn)
        .await
        .map_err(ServiceError::db_error)?;

    if result.rows_affected == 0 {
        let available = find_balance(txn, base_id, equipment_type_id)
            .await?
            .map(|b| b.current_balance)
            .unwrap_or(0);
        return Err(ServiceError::InsufficientInventory(format!(
            "available={}, requested={}",
            available, quantity
        )));
    }

    find_balance(txn, base_id, equipment_type_id)
        .await?
        .ok_or_else(|| {
            ServiceError::InternalError("Balance row vanished after debit".to_string())
        })
}
