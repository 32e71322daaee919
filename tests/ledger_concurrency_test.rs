mod common;

use garrison_api::entities::assignment::AssignmentKind;
use garrison_api::errors::ServiceError;
use garrison_api::services::assignments::RecordAssignmentCommand;
use garrison_api::services::purchases::RecordPurchaseCommand;
use garrison_api::services::transfers::InitiateTransferCommand;
use uuid::Uuid;

use common::{admin, balance_of, seed_base, seed_equipment_type, spawn_app, TestApp};

async fn stock(app: &TestApp, base_id: Uuid, equipment_type_id: Uuid, quantity: i64) {
    app.services
        .purchases
        .record_purchase(
            &admin(),
            RecordPurchaseCommand {
                base_id,
                equipment_type_id,
                quantity,
                supplier: None,
                purchase_date: None,
                notes: None,
            },
        )
        .await
        .expect("stocking purchase");
}

#[tokio::test]
async fn two_concurrent_full_drains_admit_exactly_one() {
    let app = spawn_app().await;
    let base = seed_base(&app, "Fort Ridge").await;
    let ammo = seed_equipment_type(&app, "5.56mm rounds").await;
    stock(&app, base.id, ammo.id, 5).await;

    let mut tasks = Vec::new();
    for _ in 0..2 {
        let services = app.services.clone();
        let base_id = base.id;
        let equipment_type_id = ammo.id;
        tasks.push(tokio::spawn(async move {
            services
                .assignments
                .record_assignment(
                    &admin(),
                    RecordAssignmentCommand {
                        base_id,
                        equipment_type_id,
                        quantity: 5,
                        kind: AssignmentKind::Assigned,
                        assigned_to: None,
                        notes: None,
                    },
                )
                .await
        }));
    }

    let mut successes = 0;
    let mut insufficient = 0;
    for task in tasks {
        match task.await.expect("task panicked") {
            Ok(_) => successes += 1,
            Err(ServiceError::InsufficientInventory(_)) => insufficient += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 1, "exactly one drain must win");
    assert_eq!(insufficient, 1, "the loser must see a business rejection");
    assert_eq!(balance_of(&app, base.id, ammo.id).await, 0);
}

#[tokio::test]
async fn concurrent_unit_assignments_never_overdraw() {
    let app = spawn_app().await;
    let base = seed_base(&app, "Fort Ridge").await;
    let ammo = seed_equipment_type(&app, "5.56mm rounds").await;
    stock(&app, base.id, ammo.id, 10).await;

    // Try 20 concurrent assignments of 1 unit each; expect only 10 successes
    let mut tasks = Vec::new();
    for _ in 0..20 {
        let services = app.services.clone();
        let base_id = base.id;
        let equipment_type_id = ammo.id;
        tasks.push(tokio::spawn(async move {
            services
                .assignments
                .record_assignment(
                    &admin(),
                    RecordAssignmentCommand {
                        base_id,
                        equipment_type_id,
                        quantity: 1,
                        kind: AssignmentKind::Expended,
                        assigned_to: None,
                        notes: None,
                    },
                )
                .await
                .is_ok()
        }));
    }

    let mut success = 0;
    for task in tasks {
        if task.await.unwrap_or(false) {
            success += 1;
        }
    }

    assert_eq!(
        success, 10,
        "exactly 10 assignments should succeed; got {}",
        success
    );
    assert_eq!(balance_of(&app, base.id, ammo.id).await, 0);
}

#[tokio::test]
async fn concurrent_transfer_initiations_cannot_reserve_the_same_stock() {
    let app = spawn_app().await;
    let alpha = seed_base(&app, "Alpha").await;
    let bravo = seed_base(&app, "Bravo").await;
    let rifle = seed_equipment_type(&app, "Rifle").await;
    stock(&app, alpha.id, rifle.id, 5).await;

    // Four concurrent transfers of 2: at most two reservations fit into 5
    let mut tasks = Vec::new();
    for _ in 0..4 {
        let services = app.services.clone();
        let from = alpha.id;
        let to = bravo.id;
        let equipment_type_id = rifle.id;
        tasks.push(tokio::spawn(async move {
            services
                .transfers
                .initiate_transfer(
                    &admin(),
                    InitiateTransferCommand {
                        from_base_id: from,
                        to_base_id: to,
                        equipment_type_id,
                        quantity: 2,
                        notes: None,
                    },
                )
                .await
        }));
    }

    let mut successes = 0;
    for task in tasks {
        match task.await.expect("task panicked") {
            Ok(_) => successes += 1,
            Err(ServiceError::InsufficientInventory(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 2, "only two reservations fit into a balance of 5");
    assert_eq!(balance_of(&app, alpha.id, rifle.id).await, 1);

    // Conservation: every successful reservation is visible as a pending row
    let pending = app
        .services
        .transfers
        .list_transfers(&admin(), &Default::default())
        .await
        .unwrap();
    assert_eq!(pending.len(), 2);
}
