pub mod assignments;
pub mod bases;
pub mod common;
pub mod dashboard;
pub mod equipment_types;
pub mod inventory;
pub mod purchases;
pub mod transfers;

use crate::audit::AuditSink;
use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub bases: Arc<crate::services::bases::BaseService>,
    pub equipment_types: Arc<crate::services::equipment_types::EquipmentTypeService>,
    pub inventory: Arc<crate::services::inventory::InventoryService>,
    pub purchases: Arc<crate::services::purchases::PurchaseService>,
    pub transfers: Arc<crate::services::transfers::TransferService>,
    pub assignments: Arc<crate::services::assignments::AssignmentService>,
    pub dashboard: Arc<crate::services::reports::DashboardService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: EventSender,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let bases = Arc::new(crate::services::bases::BaseService::new(
            db_pool.clone(),
            event_sender.clone(),
            audit.clone(),
        ));
        let equipment_types = Arc::new(
            crate::services::equipment_types::EquipmentTypeService::new(
                db_pool.clone(),
                event_sender.clone(),
                audit.clone(),
            ),
        );
        let inventory = Arc::new(crate::services::inventory::InventoryService::new(
            db_pool.clone(),
        ));
        let purchases = Arc::new(crate::services::purchases::PurchaseService::new(
            db_pool.clone(),
            event_sender.clone(),
            audit.clone(),
        ));
        let transfers = Arc::new(crate::services::transfers::TransferService::new(
            db_pool.clone(),
            event_sender.clone(),
            audit.clone(),
        ));
        let assignments = Arc::new(crate::services::assignments::AssignmentService::new(
            db_pool.clone(),
            event_sender,
            audit,
        ));
        let dashboard = Arc::new(crate::services::reports::DashboardService::new(db_pool));

        Self {
            bases,
            equipment_types,
            inventory,
            purchases,
            transfers,
            assignments,
            dashboard,
        }
    }
}
