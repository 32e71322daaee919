#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use tempfile::TempDir;
use tokio::sync::mpsc;
use uuid::Uuid;

use garrison_api::audit::{AuditSink, DbAuditSink};
use garrison_api::auth::policy::{Actor, Role};
use garrison_api::db::{self, DbPool};
use garrison_api::entities::{base, equipment_type, user};
use garrison_api::events::{self, EventSender};
use garrison_api::handlers::AppServices;

/// A fully migrated application over a throwaway SQLite database.
///
/// The database file lives in a temp directory that is removed when the
/// harness drops, so every test starts from a clean ledger.
pub struct TestApp {
    pub db: Arc<DbPool>,
    pub services: AppServices,
    pub event_sender: EventSender,
    _tmp: TempDir,
}

pub async fn spawn_app() -> TestApp {
    let tmp = TempDir::new().expect("temp dir");
    let db_path = tmp.path().join("garrison-test.db");
    let url = format!("sqlite://{}?mode=rwc", db_path.display());

    let pool = db::establish_connection(&url).await.expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");

    let db_arc = Arc::new(pool);

    let (tx, rx) = mpsc::channel(256);
    let event_sender = EventSender::new(tx);
    tokio::spawn(events::process_events(rx));

    let audit: Arc<dyn AuditSink> = Arc::new(DbAuditSink::new(db_arc.clone()));
    let services = AppServices::new(db_arc.clone(), event_sender.clone(), audit);

    TestApp {
        db: db_arc,
        services,
        event_sender,
        _tmp: tmp,
    }
}

pub fn admin() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Admin, None)
}

pub fn commander_of(base_id: Uuid) -> Actor {
    Actor::new(Uuid::new_v4(), Role::Commander, Some(base_id))
}

pub fn logistics_of(base_id: Uuid) -> Actor {
    Actor::new(Uuid::new_v4(), Role::Logistics, Some(base_id))
}

pub async fn seed_base(app: &TestApp, name: &str) -> base::Model {
    base::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        location: Set(format!("{} location", name)),
        created_at: Set(Utc::now()),
    }
    .insert(app.db.as_ref())
    .await
    .expect("seed base")
}

pub async fn seed_equipment_type(app: &TestApp, name: &str) -> equipment_type::Model {
    equipment_type::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        category: Set("weapon".to_string()),
        unit: Set("each".to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(app.db.as_ref())
    .await
    .expect("seed equipment type")
}

pub async fn seed_user(
    app: &TestApp,
    username: &str,
    password: &str,
    role: Role,
    base_id: Option<Uuid>,
) -> user::Model {
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        password_hash: Set(garrison_api::auth::hash_password(password).expect("hash")),
        role: Set(role.to_string()),
        base_id: Set(base_id),
        created_at: Set(Utc::now()),
    }
    .insert(app.db.as_ref())
    .await
    .expect("seed user")
}

/// Current balance for a pair, or zero when no row exists yet
pub async fn balance_of(app: &TestApp, base_id: Uuid, equipment_type_id: Uuid) -> i64 {
    app.services
        .inventory
        .get_balance(base_id, equipment_type_id)
        .await
        .expect("balance query")
        .map(|b| b.current_balance)
        .unwrap_or(0)
}
