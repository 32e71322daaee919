mod common;

use assert_matches::assert_matches;
use garrison_api::entities::assignment::AssignmentKind;
use garrison_api::errors::ServiceError;
use garrison_api::queries::RecordFilter;
use garrison_api::services::assignments::RecordAssignmentCommand;
use garrison_api::services::purchases::RecordPurchaseCommand;
use uuid::Uuid;

use common::{admin, balance_of, commander_of, seed_base, seed_equipment_type, spawn_app};

fn purchase_cmd(base_id: Uuid, equipment_type_id: Uuid, quantity: i64) -> RecordPurchaseCommand {
    RecordPurchaseCommand {
        base_id,
        equipment_type_id,
        quantity,
        supplier: Some("Northrop Logistics".to_string()),
        purchase_date: None,
        notes: None,
    }
}

fn assignment_cmd(
    base_id: Uuid,
    equipment_type_id: Uuid,
    quantity: i64,
    kind: AssignmentKind,
) -> RecordAssignmentCommand {
    RecordAssignmentCommand {
        base_id,
        equipment_type_id,
        quantity,
        kind,
        assigned_to: Some("Sgt. Alvarez".to_string()),
        notes: None,
    }
}

#[tokio::test]
async fn purchase_creates_balance_lazily_and_credits_it() {
    let app = spawn_app().await;
    let base = seed_base(&app, "Fort Ridge").await;
    let rifle = seed_equipment_type(&app, "Rifle").await;

    assert_eq!(balance_of(&app, base.id, rifle.id).await, 0);

    let purchase = app
        .services
        .purchases
        .record_purchase(&admin(), purchase_cmd(base.id, rifle.id, 40))
        .await
        .expect("purchase");
    assert_eq!(purchase.quantity, 40);
    assert_eq!(balance_of(&app, base.id, rifle.id).await, 40);

    // Second purchase increments the same row
    app.services
        .purchases
        .record_purchase(&admin(), purchase_cmd(base.id, rifle.id, 2))
        .await
        .expect("second purchase");
    assert_eq!(balance_of(&app, base.id, rifle.id).await, 42);
}

#[tokio::test]
async fn purchase_rejects_bad_input_before_any_write() {
    let app = spawn_app().await;
    let base = seed_base(&app, "Fort Ridge").await;
    let rifle = seed_equipment_type(&app, "Rifle").await;

    let err = app
        .services
        .purchases
        .record_purchase(&admin(), purchase_cmd(base.id, rifle.id, 0))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));

    // Unknown base and unknown equipment type are input errors too
    let err = app
        .services
        .purchases
        .record_purchase(&admin(), purchase_cmd(Uuid::new_v4(), rifle.id, 5))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));

    let err = app
        .services
        .purchases
        .record_purchase(&admin(), purchase_cmd(base.id, Uuid::new_v4(), 5))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));

    // Nothing was credited and no purchase row exists
    assert_eq!(balance_of(&app, base.id, rifle.id).await, 0);
    let purchases = app
        .services
        .purchases
        .list_purchases(&admin(), &RecordFilter::default())
        .await
        .unwrap();
    assert!(purchases.is_empty());
}

#[tokio::test]
async fn purchase_for_foreign_base_is_denied_before_any_write() {
    let app = spawn_app().await;
    let home = seed_base(&app, "Fort Ridge").await;
    let foreign = seed_base(&app, "Camp Delta").await;
    let rifle = seed_equipment_type(&app, "Rifle").await;

    let actor = commander_of(home.id);
    let err = app
        .services
        .purchases
        .record_purchase(&actor, purchase_cmd(foreign.id, rifle.id, 5))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));
    assert_eq!(balance_of(&app, foreign.id, rifle.id).await, 0);

    // The commander can purchase for their own base
    app.services
        .purchases
        .record_purchase(&actor, purchase_cmd(home.id, rifle.id, 5))
        .await
        .expect("own-base purchase");
    assert_eq!(balance_of(&app, home.id, rifle.id).await, 5);
}

#[tokio::test]
async fn assignment_debits_balance_and_rejects_overdraft() {
    let app = spawn_app().await;
    let base = seed_base(&app, "Fort Ridge").await;
    let ammo = seed_equipment_type(&app, "5.56mm rounds").await;

    app.services
        .purchases
        .record_purchase(&admin(), purchase_cmd(base.id, ammo.id, 100))
        .await
        .unwrap();

    let record = app
        .services
        .assignments
        .record_assignment(
            &admin(),
            assignment_cmd(base.id, ammo.id, 30, AssignmentKind::Assigned),
        )
        .await
        .expect("assignment");
    assert_eq!(record.kind, "assigned");
    assert_eq!(balance_of(&app, base.id, ammo.id).await, 70);

    // Expenditure debits identically
    app.services
        .assignments
        .record_assignment(
            &admin(),
            assignment_cmd(base.id, ammo.id, 50, AssignmentKind::Expended),
        )
        .await
        .expect("expenditure");
    assert_eq!(balance_of(&app, base.id, ammo.id).await, 20);

    // Overdraft is a business rejection and leaves no partial debit
    let err = app
        .services
        .assignments
        .record_assignment(
            &admin(),
            assignment_cmd(base.id, ammo.id, 21, AssignmentKind::Assigned),
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientInventory(_));
    assert!(err.is_business_rejection());
    assert_eq!(balance_of(&app, base.id, ammo.id).await, 20);
}

#[tokio::test]
async fn assignment_against_missing_balance_is_insufficient() {
    let app = spawn_app().await;
    let base = seed_base(&app, "Fort Ridge").await;
    let ammo = seed_equipment_type(&app, "5.56mm rounds").await;

    let err = app
        .services
        .assignments
        .record_assignment(
            &admin(),
            assignment_cmd(base.id, ammo.id, 1, AssignmentKind::Assigned),
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientInventory(_));
}

#[tokio::test]
async fn assignment_for_foreign_base_is_denied() {
    let app = spawn_app().await;
    let home = seed_base(&app, "Fort Ridge").await;
    let foreign = seed_base(&app, "Camp Delta").await;
    let ammo = seed_equipment_type(&app, "5.56mm rounds").await;

    app.services
        .purchases
        .record_purchase(&admin(), purchase_cmd(foreign.id, ammo.id, 10))
        .await
        .unwrap();

    let err = app
        .services
        .assignments
        .record_assignment(
            &commander_of(home.id),
            assignment_cmd(foreign.id, ammo.id, 1, AssignmentKind::Assigned),
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));
    assert_eq!(balance_of(&app, foreign.id, ammo.id).await, 10);
}

#[tokio::test]
async fn balance_conserves_credits_minus_debits() {
    let app = spawn_app().await;
    let base = seed_base(&app, "Fort Ridge").await;
    let other = seed_base(&app, "Camp Delta").await;
    let ammo = seed_equipment_type(&app, "5.56mm rounds").await;

    // Credits: 200 + 50; debits: 30 assigned, 20 expended, 25 transferred out
    for qty in [200, 50] {
        app.services
            .purchases
            .record_purchase(&admin(), purchase_cmd(base.id, ammo.id, qty))
            .await
            .unwrap();
    }
    app.services
        .assignments
        .record_assignment(
            &admin(),
            assignment_cmd(base.id, ammo.id, 30, AssignmentKind::Assigned),
        )
        .await
        .unwrap();
    app.services
        .assignments
        .record_assignment(
            &admin(),
            assignment_cmd(base.id, ammo.id, 20, AssignmentKind::Expended),
        )
        .await
        .unwrap();
    let transfer = app
        .services
        .transfers
        .initiate_transfer(
            &admin(),
            garrison_api::services::transfers::InitiateTransferCommand {
                from_base_id: base.id,
                to_base_id: other.id,
                equipment_type_id: ammo.id,
                quantity: 25,
                notes: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(
        balance_of(&app, base.id, ammo.id).await,
        200 + 50 - 30 - 20 - 25
    );

    // A cancelled transfer refunds its debit, restoring conservation
    app.services
        .transfers
        .finalize_transfer(
            &admin(),
            transfer.id,
            garrison_api::auth::TransferDecision::Cancel,
        )
        .await
        .unwrap();
    assert_eq!(balance_of(&app, base.id, ammo.id).await, 200 + 50 - 30 - 20);
}

#[tokio::test]
async fn record_listings_are_scoped_to_the_actor() {
    let app = spawn_app().await;
    let alpha = seed_base(&app, "Alpha").await;
    let bravo = seed_base(&app, "Bravo").await;
    let rifle = seed_equipment_type(&app, "Rifle").await;

    app.services
        .purchases
        .record_purchase(&admin(), purchase_cmd(alpha.id, rifle.id, 10))
        .await
        .unwrap();
    app.services
        .purchases
        .record_purchase(&admin(), purchase_cmd(bravo.id, rifle.id, 20))
        .await
        .unwrap();

    // Admin sees both, and can narrow to one base
    let all = app
        .services
        .purchases
        .list_purchases(&admin(), &RecordFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let narrowed = app
        .services
        .purchases
        .list_purchases(
            &admin(),
            &RecordFilter {
                base_id: Some(alpha.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(narrowed.len(), 1);
    assert_eq!(narrowed[0].base_id, alpha.id);

    // A base-scoped actor sees only their home base, even when asking wider
    let scoped = app
        .services
        .purchases
        .list_purchases(
            &commander_of(alpha.id),
            &RecordFilter {
                base_id: Some(bravo.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].base_id, alpha.id);
}
