use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::policy::Actor,
    entities::{
        assignment::{self, AssignmentKind, Entity as Assignments},
        equipment_type::Entity as EquipmentTypes,
        inventory_balance::{self, Entity as InventoryBalance},
        purchase::{self, Entity as Purchases},
        transfer::{self, Entity as Transfers, TransferStatus},
    },
    errors::ServiceError,
    queries::RecordFilter,
};

/// Per-equipment-type movement figures over the requested window.
///
/// `opening_balance` is derived by back-solving from the closing snapshot and
/// the period movements; it is a reporting view, not ledger state.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EquipmentMovement {
    pub equipment_type_id: Uuid,
    pub name: String,
    pub opening_balance: i64,
    pub closing_balance: i64,
    pub net_movement: i64,
    pub purchases: i64,
    pub transfer_in: i64,
    pub transfer_out: i64,
    pub assigned: i64,
    pub expended: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MovementSummary {
    pub opening_balance: i64,
    pub closing_balance: i64,
    pub net_movement: i64,
    pub assigned: i64,
    pub expended: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NetMovementBreakdown {
    pub purchases: i64,
    pub transfer_in: i64,
    pub transfer_out: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardMetrics {
    pub summary: MovementSummary,
    pub inventory: Vec<EquipmentMovement>,
    pub net_movement_breakdown: NetMovementBreakdown,
}

/// Read-only reporting over the ledger tables. Takes no locks and never
/// participates in ledger transactions; figures may trail in-flight writes.
#[derive(Clone)]
pub struct DashboardService {
    db_pool: Arc<DatabaseConnection>,
}

impl DashboardService {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, actor))]
    pub async fn movement_metrics(
        &self,
        actor: &Actor,
        filter: &RecordFilter,
    ) -> Result<DashboardMetrics, ServiceError> {
        let db = self.db_pool.as_ref();
        let visible_base = filter.visible_base(actor);
        let (start, end) = filter.date_bounds();

        // Closing balance: current snapshot, no date filter
        let mut balance_condition = Condition::all();
        if let Some(base_id) = visible_base {
            balance_condition = balance_condition.add(inventory_balance::Column::BaseId.eq(base_id));
        }
        if let Some(equipment_type_id) = filter.equipment_type_id {
            balance_condition = balance_condition
                .add(inventory_balance::Column::EquipmentTypeId.eq(equipment_type_id));
        }
        let balances = InventoryBalance::find()
            .filter(balance_condition)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        // Purchases in period
        let purchases = Purchases::find()
            .filter(filter.to_condition(
                actor,
                purchase::Column::BaseId,
                purchase::Column::EquipmentTypeId,
                purchase::Column::PurchaseDate,
            ))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        // Transfers out in period: everything the base sent that was not
        // refunded by a cancellation
        let mut out_condition = Condition::all()
            .add(transfer::Column::Status.ne(TransferStatus::Cancelled.as_str()));
        if let Some(base_id) = visible_base {
            out_condition = out_condition.add(transfer::Column::FromBaseId.eq(base_id));
        }
        if let Some(equipment_type_id) = filter.equipment_type_id {
            out_condition = out_condition.add(transfer::Column::EquipmentTypeId.eq(equipment_type_id));
        }
        if let Some(start) = start {
            out_condition = out_condition.add(transfer::Column::CreatedAt.gte(start));
        }
        if let Some(end) = end {
            out_condition = out_condition.add(transfer::Column::CreatedAt.lt(end));
        }
        let transfers_out = Transfers::find()
            .filter(out_condition)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        // Transfers in in period: only completed transfers have credited the
        // destination
        let mut in_condition = Condition::all()
            .add(transfer::Column::Status.eq(TransferStatus::Completed.as_str()));
        if let Some(base_id) = visible_base {
            in_condition = in_condition.add(transfer::Column::ToBaseId.eq(base_id));
        }
        if let Some(equipment_type_id) = filter.equipment_type_id {
            in_condition = in_condition.add(transfer::Column::EquipmentTypeId.eq(equipment_type_id));
        }
        if let Some(start) = start {
            in_condition = in_condition.add(transfer::Column::CreatedAt.gte(start));
        }
        if let Some(end) = end {
            in_condition = in_condition.add(transfer::Column::CreatedAt.lt(end));
        }
        let transfers_in = Transfers::find()
            .filter(in_condition)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        // Assignments in period
        let assignments = Assignments::find()
            .filter(filter.to_condition(
                actor,
                assignment::Column::BaseId,
                assignment::Column::EquipmentTypeId,
                assignment::Column::CreatedAt,
            ))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        // Aggregate per equipment type
        let mut closing: BTreeMap<Uuid, i64> = BTreeMap::new();
        for b in &balances {
            *closing.entry(b.equipment_type_id).or_default() += b.current_balance;
        }
        let mut purchased: BTreeMap<Uuid, i64> = BTreeMap::new();
        for p in &purchases {
            *purchased.entry(p.equipment_type_id).or_default() += p.quantity;
        }
        let mut moved_out: BTreeMap<Uuid, i64> = BTreeMap::new();
        for t in &transfers_out {
            *moved_out.entry(t.equipment_type_id).or_default() += t.quantity;
        }
        let mut moved_in: BTreeMap<Uuid, i64> = BTreeMap::new();
        for t in &transfers_in {
            *moved_in.entry(t.equipment_type_id).or_default() += t.quantity;
        }
        let mut assigned: BTreeMap<Uuid, i64> = BTreeMap::new();
        let mut expended: BTreeMap<Uuid, i64> = BTreeMap::new();
        for a in &assignments {
            match a.kind() {
                Some(AssignmentKind::Assigned) => {
                    *assigned.entry(a.equipment_type_id).or_default() += a.quantity;
                }
                Some(AssignmentKind::Expended) => {
                    *expended.entry(a.equipment_type_id).or_default() += a.quantity;
                }
                None => {}
            }
        }

        let mut all_ids: BTreeMap<Uuid, ()> = BTreeMap::new();
        for id in closing
            .keys()
            .chain(purchased.keys())
            .chain(moved_out.keys())
            .chain(moved_in.keys())
            .chain(assigned.keys())
            .chain(expended.keys())
        {
            all_ids.insert(*id, ());
        }

        let names: HashMap<Uuid, String> = EquipmentTypes::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|e| (e.id, e.name))
            .collect();

        let mut inventory = Vec::with_capacity(all_ids.len());
        for id in all_ids.keys() {
            let closing_balance = closing.get(id).copied().unwrap_or(0);
            let purchases = purchased.get(id).copied().unwrap_or(0);
            let transfer_in = moved_in.get(id).copied().unwrap_or(0);
            let transfer_out = moved_out.get(id).copied().unwrap_or(0);
            let assigned = assigned.get(id).copied().unwrap_or(0);
            let expended = expended.get(id).copied().unwrap_or(0);
            let net_movement = purchases + transfer_in - transfer_out;
            let opening_balance = closing_balance - net_movement + assigned + expended;

            inventory.push(EquipmentMovement {
                equipment_type_id: *id,
                name: names
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| format!("Equipment {}", id)),
                opening_balance,
                closing_balance,
                net_movement,
                purchases,
                transfer_in,
                transfer_out,
                assigned,
                expended,
            });
        }

        let summary = inventory.iter().fold(
            MovementSummary::default(),
            |mut acc, item| {
                acc.opening_balance += item.opening_balance;
                acc.closing_balance += item.closing_balance;
                acc.net_movement += item.net_movement;
                acc.assigned += item.assigned;
                acc.expended += item.expended;
                acc
            },
        );

        let net_movement_breakdown = NetMovementBreakdown {
            purchases: inventory.iter().map(|i| i.purchases).sum(),
            transfer_in: inventory.iter().map(|i| i.transfer_in).sum(),
            transfer_out: inventory.iter().map(|i| i.transfer_out).sum(),
        };

        Ok(DashboardMetrics {
            summary,
            inventory,
            net_movement_breakdown,
        })
    }
}
