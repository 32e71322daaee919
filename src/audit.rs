//! Best-effort audit trail.
//!
//! Ledger services report every successful mutation through an injected
//! [`AuditSink`]. The contract is best-effort: a sink failure is logged and
//! swallowed, never surfaced to the caller and never able to roll back the
//! mutation it describes.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::entities::audit_log;

/// One recorded mutation: who did what to which entity.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub user_id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
}

impl AuditEntry {
    pub fn new(user_id: Uuid, action: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            user_id,
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: None,
            old_values: None,
            new_values: None,
        }
    }

    pub fn entity_id(mut self, id: Uuid) -> Self {
        self.entity_id = Some(id);
        self
    }

    pub fn old_values(mut self, values: serde_json::Value) -> Self {
        self.old_values = Some(values);
        self
    }

    pub fn new_values(mut self, values: serde_json::Value) -> Self {
        self.new_values = Some(values);
        self
    }
}

/// Destination for audit entries.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record an entry. Implementations must swallow their own failures.
    async fn record(&self, entry: AuditEntry);
}

/// Sink that persists entries into the `audit_logs` table.
pub struct DbAuditSink {
    db: Arc<DatabaseConnection>,
}

impl DbAuditSink {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditSink for DbAuditSink {
    async fn record(&self, entry: AuditEntry) {
        let row = audit_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(entry.user_id),
            action: Set(entry.action.clone()),
            entity_type: Set(entry.entity_type.clone()),
            entity_id: Set(entry.entity_id),
            old_values: Set(entry.old_values.map(|v| v.to_string())),
            new_values: Set(entry.new_values.map(|v| v.to_string())),
            created_at: Set(Utc::now()),
        };

        if let Err(e) = row.insert(self.db.as_ref()).await {
            warn!(
                action = %entry.action,
                entity_type = %entry.entity_type,
                error = %e,
                "Audit logging failed"
            );
        }
    }
}

/// Sink that drops entries. Useful in tests and tooling.
pub struct NullAuditSink;

#[async_trait]
impl AuditSink for NullAuditSink {
    async fn record(&self, entry: AuditEntry) {
        debug!(action = %entry.action, "Audit entry discarded (null sink)");
    }
}
