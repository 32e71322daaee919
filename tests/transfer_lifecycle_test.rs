mod common;

use assert_matches::assert_matches;
use garrison_api::auth::TransferDecision;
use garrison_api::entities::transfer::TransferStatus;
use garrison_api::errors::ServiceError;
use garrison_api::services::purchases::RecordPurchaseCommand;
use garrison_api::services::transfers::InitiateTransferCommand;
use uuid::Uuid;

use common::{admin, balance_of, commander_of, seed_base, seed_equipment_type, spawn_app, TestApp};

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

fn transfer_cmd(from: Uuid, to: Uuid, equipment: Uuid, quantity: i64) -> InitiateTransferCommand {
    InitiateTransferCommand {
        from_base_id: from,
        to_base_id: to,
        equipment_type_id: equipment,
        quantity,
        notes: None,
    }
}

#[tokio::test]
async fn initiation_debits_source_immediately_and_leaves_transfer_pending() {
    let app = spawn_app().await;
    let alpha = seed_base(&app, "Alpha").await;
    let bravo = seed_base(&app, "Bravo").await;
    let rifle = seed_equipment_type(&app, "Rifle").await;
    stock(&app, alpha.id, rifle.id, 10).await;

    let transfer = app
        .services
        .transfers
        .initiate_transfer(&admin(), transfer_cmd(alpha.id, bravo.id, rifle.id, 10))
        .await
        .expect("initiate");

    // Reservation: the full quantity leaves the source balance at initiation
    assert_eq!(transfer.status(), Some(TransferStatus::Pending));
    assert_eq!(balance_of(&app, alpha.id, rifle.id).await, 0);
    assert_eq!(balance_of(&app, bravo.id, rifle.id).await, 0);

    // The reserved stock cannot be claimed by another transfer
    let err = app
        .services
        .transfers
        .initiate_transfer(&admin(), transfer_cmd(alpha.id, bravo.id, rifle.id, 1))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientInventory(_));
}

#[tokio::test]
async fn initiation_rejects_same_base_and_overdraft() {
    let app = spawn_app().await;
    let alpha = seed_base(&app, "Alpha").await;
    let bravo = seed_base(&app, "Bravo").await;
    let rifle = seed_equipment_type(&app, "Rifle").await;
    stock(&app, alpha.id, rifle.id, 5).await;

    let err = app
        .services
        .transfers
        .initiate_transfer(&admin(), transfer_cmd(alpha.id, alpha.id, rifle.id, 1))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));

    let err = app
        .services
        .transfers
        .initiate_transfer(&admin(), transfer_cmd(alpha.id, bravo.id, rifle.id, 6))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientInventory(_));

    // No partial state: balance untouched, no transfer row
    assert_eq!(balance_of(&app, alpha.id, rifle.id).await, 5);
    let transfers = app
        .services
        .transfers
        .list_transfers(&admin(), &Default::default())
        .await
        .unwrap();
    assert!(transfers.is_empty());
}

#[tokio::test]
async fn completion_credits_destination_and_leaves_source_alone() {
    let app = spawn_app().await;
    let alpha = seed_base(&app, "Alpha").await;
    let bravo = seed_base(&app, "Bravo").await;
    let rifle = seed_equipment_type(&app, "Rifle").await;
    stock(&app, alpha.id, rifle.id, 10).await;

    let transfer = app
        .services
        .transfers
        .initiate_transfer(&admin(), transfer_cmd(alpha.id, bravo.id, rifle.id, 3))
        .await
        .unwrap();
    assert_eq!(balance_of(&app, alpha.id, rifle.id).await, 7);

    let completed = app
        .services
        .transfers
        .finalize_transfer(&admin(), transfer.id, TransferDecision::Complete)
        .await
        .expect("complete");

    assert_eq!(completed.status(), Some(TransferStatus::Completed));
    // Source was already debited at initiation; only the destination moves
    assert_eq!(balance_of(&app, alpha.id, rifle.id).await, 7);
    assert_eq!(balance_of(&app, bravo.id, rifle.id).await, 3);
}

#[tokio::test]
async fn cancellation_refunds_source_exactly() {
    let app = spawn_app().await;
    let alpha = seed_base(&app, "Alpha").await;
    let bravo = seed_base(&app, "Bravo").await;
    let rifle = seed_equipment_type(&app, "Rifle").await;
    stock(&app, alpha.id, rifle.id, 10).await;

    let transfer = app
        .services
        .transfers
        .initiate_transfer(&admin(), transfer_cmd(alpha.id, bravo.id, rifle.id, 3))
        .await
        .unwrap();
    assert_eq!(balance_of(&app, alpha.id, rifle.id).await, 7);

    let cancelled = app
        .services
        .transfers
        .finalize_transfer(&admin(), transfer.id, TransferDecision::Cancel)
        .await
        .expect("cancel");

    assert_eq!(cancelled.status(), Some(TransferStatus::Cancelled));
    assert_eq!(balance_of(&app, alpha.id, rifle.id).await, 10);
    assert_eq!(balance_of(&app, bravo.id, rifle.id).await, 0);
}

#[tokio::test]
async fn finalized_transfers_admit_no_further_transitions() {
    let app = spawn_app().await;
    let alpha = seed_base(&app, "Alpha").await;
    let bravo = seed_base(&app, "Bravo").await;
    let rifle = seed_equipment_type(&app, "Rifle").await;
    stock(&app, alpha.id, rifle.id, 10).await;

    let transfer = app
        .services
        .transfers
        .initiate_transfer(&admin(), transfer_cmd(alpha.id, bravo.id, rifle.id, 4))
        .await
        .unwrap();
    app.services
        .transfers
        .finalize_transfer(&admin(), transfer.id, TransferDecision::Complete)
        .await
        .unwrap();

    let alpha_before = balance_of(&app, alpha.id, rifle.id).await;
    let bravo_before = balance_of(&app, bravo.id, rifle.id).await;

    // Every further transition attempt fails and moves no stock
    for decision in [TransferDecision::Complete, TransferDecision::Cancel] {
        let err = app
            .services
            .transfers
            .finalize_transfer(&admin(), transfer.id, decision)
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::InvalidStatus(_));
    }
    assert_eq!(balance_of(&app, alpha.id, rifle.id).await, alpha_before);
    assert_eq!(balance_of(&app, bravo.id, rifle.id).await, bravo_before);

    // Same closure for cancelled transfers
    let second = app
        .services
        .transfers
        .initiate_transfer(&admin(), transfer_cmd(alpha.id, bravo.id, rifle.id, 2))
        .await
        .unwrap();
    app.services
        .transfers
        .finalize_transfer(&admin(), second.id, TransferDecision::Cancel)
        .await
        .unwrap();
    let err = app
        .services
        .transfers
        .finalize_transfer(&admin(), second.id, TransferDecision::Complete)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidStatus(_));
}

#[tokio::test]
async fn finalizing_an_unknown_transfer_is_not_found() {
    let app = spawn_app().await;

    let err = app
        .services
        .transfers
        .finalize_transfer(&admin(), Uuid::new_v4(), TransferDecision::Complete)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn authorization_boundary_for_initiation_and_finalization() {
    let app = spawn_app().await;
    let alpha = seed_base(&app, "Alpha").await;
    let bravo = seed_base(&app, "Bravo").await;
    let charlie = seed_base(&app, "Charlie").await;
    let rifle = seed_equipment_type(&app, "Rifle").await;
    stock(&app, alpha.id, rifle.id, 10).await;

    let outsider = commander_of(charlie.id);

    // A base-C actor may not initiate from base A
    let err = app
        .services
        .transfers
        .initiate_transfer(&outsider, transfer_cmd(alpha.id, bravo.id, rifle.id, 1))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    let transfer = app
        .services
        .transfers
        .initiate_transfer(&commander_of(alpha.id), transfer_cmd(alpha.id, bravo.id, rifle.id, 5))
        .await
        .unwrap();

    // Neither the bystander nor the source may complete; only the destination
    for actor in [outsider, commander_of(alpha.id)] {
        let err = app
            .services
            .transfers
            .finalize_transfer(&actor, transfer.id, TransferDecision::Complete)
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::Forbidden(_));
    }

    // Neither the bystander nor the destination may cancel; only the source
    for actor in [outsider, commander_of(bravo.id)] {
        let err = app
            .services
            .transfers
            .finalize_transfer(&actor, transfer.id, TransferDecision::Cancel)
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::Forbidden(_));
    }

    // A failed authorization left the transfer pending and balances untouched
    assert_eq!(balance_of(&app, alpha.id, rifle.id).await, 5);
    assert_eq!(balance_of(&app, bravo.id, rifle.id).await, 0);

    // The destination commander completes it
    let completed = app
        .services
        .transfers
        .finalize_transfer(&commander_of(bravo.id), transfer.id, TransferDecision::Complete)
        .await
        .unwrap();
    assert_eq!(completed.status(), Some(TransferStatus::Completed));
    assert_eq!(balance_of(&app, bravo.id, rifle.id).await, 5);
}

#[tokio::test]
async fn transfer_visibility_follows_base_membership() {
    let app = spawn_app().await;
    let alpha = seed_base(&app, "Alpha").await;
    let bravo = seed_base(&app, "Bravo").await;
    let charlie = seed_base(&app, "Charlie").await;
    let rifle = seed_equipment_type(&app, "Rifle").await;
    stock(&app, alpha.id, rifle.id, 10).await;

    let transfer = app
        .services
        .transfers
        .initiate_transfer(&admin(), transfer_cmd(alpha.id, bravo.id, rifle.id, 2))
        .await
        .unwrap();

    // Both endpoints see it in listings; an uninvolved base does not
    for actor in [commander_of(alpha.id), commander_of(bravo.id)] {
        let listed = app
            .services
            .transfers
            .list_transfers(&actor, &Default::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
    }
    let hidden = app
        .services
        .transfers
        .list_transfers(&commander_of(charlie.id), &Default::default())
        .await
        .unwrap();
    assert!(hidden.is_empty());

    // Point lookups enforce the same visibility
    assert_matches!(
        app.services
            .transfers
            .get_transfer(&commander_of(charlie.id), transfer.id)
            .await
            .unwrap_err(),
        ServiceError::Forbidden(_)
    );
    assert!(app
        .services
        .transfers
        .get_transfer(&commander_of(bravo.id), transfer.id)
        .await
        .is_ok());
}
