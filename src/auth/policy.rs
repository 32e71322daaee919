//! Access policy for ledger operations.
//!
//! A pure function of (actor role, actor home base, target base, operation).
//! It holds no state and must be consulted before any lock is taken; a denial
//! short-circuits the operation.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::errors::ServiceError;

/// System roles. Admin is the global authority; the other two are scoped to
/// their home base.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Commander,
    Logistics,
}

impl Role {
    pub fn is_global(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// The identity a ledger operation runs as.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
    /// Home base for base-scoped roles; None for admins
    pub base_id: Option<Uuid>,
}

impl Actor {
    pub fn new(user_id: Uuid, role: Role, base_id: Option<Uuid>) -> Self {
        Self {
            user_id,
            role,
            base_id,
        }
    }
}

/// Which way a pending transfer is being finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDecision {
    Complete,
    Cancel,
}

impl TransferDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferDecision::Complete => "complete",
            TransferDecision::Cancel => "cancel",
        }
    }
}

/// May the actor run a mutating ledger operation against `base_id`?
pub fn can_operate_on_base(actor: &Actor, base_id: Uuid) -> bool {
    actor.role.is_global() || actor.base_id == Some(base_id)
}

/// May the actor finalize a transfer the given way? Completion is the
/// receiving side's acknowledgement, cancellation is the sender's recall.
pub fn can_finalize_transfer(
    actor: &Actor,
    from_base_id: Uuid,
    to_base_id: Uuid,
    decision: TransferDecision,
) -> bool {
    match decision {
        TransferDecision::Complete => can_operate_on_base(actor, to_base_id),
        TransferDecision::Cancel => can_operate_on_base(actor, from_base_id),
    }
}

/// Policy check that maps a denial onto the error taxonomy.
pub fn ensure_can_operate_on_base(actor: &Actor, base_id: Uuid) -> Result<(), ServiceError> {
    if can_operate_on_base(actor, base_id) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "Access denied to operate on this base".to_string(),
        ))
    }
}

pub fn ensure_can_finalize_transfer(
    actor: &Actor,
    from_base_id: Uuid,
    to_base_id: Uuid,
    decision: TransferDecision,
) -> Result<(), ServiceError> {
    if can_finalize_transfer(actor, from_base_id, to_base_id, decision) {
        Ok(())
    } else {
        let msg = match decision {
            TransferDecision::Complete => {
                "Only the destination base or an admin can complete this transfer"
            }
            TransferDecision::Cancel => {
                "Only the source base or an admin can cancel this transfer"
            }
        };
        Err(ServiceError::Forbidden(msg.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Actor {
        Actor::new(Uuid::new_v4(), Role::Admin, None)
    }

    fn commander_of(base: Uuid) -> Actor {
        Actor::new(Uuid::new_v4(), Role::Commander, Some(base))
    }

    #[test]
    fn admin_operates_on_any_base() {
        let base = Uuid::new_v4();
        assert!(can_operate_on_base(&admin(), base));
    }

    #[test]
    fn base_scoped_roles_are_confined_to_their_home_base() {
        let home = Uuid::new_v4();
        let other = Uuid::new_v4();
        let actor = commander_of(home);

        assert!(can_operate_on_base(&actor, home));
        assert!(!can_operate_on_base(&actor, other));

        let logistics = Actor::new(Uuid::new_v4(), Role::Logistics, Some(home));
        assert!(can_operate_on_base(&logistics, home));
        assert!(!can_operate_on_base(&logistics, other));
    }

    #[test]
    fn completion_keys_on_the_destination_base() {
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();

        let receiver = commander_of(to);
        let sender = commander_of(from);

        assert!(can_finalize_transfer(
            &receiver,
            from,
            to,
            TransferDecision::Complete
        ));
        assert!(!can_finalize_transfer(
            &sender,
            from,
            to,
            TransferDecision::Complete
        ));
    }

    #[test]
    fn cancellation_keys_on_the_source_base() {
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();

        let receiver = commander_of(to);
        let sender = commander_of(from);

        assert!(can_finalize_transfer(
            &sender,
            from,
            to,
            TransferDecision::Cancel
        ));
        assert!(!can_finalize_transfer(
            &receiver,
            from,
            to,
            TransferDecision::Cancel
        ));
    }

    #[test]
    fn admin_can_finalize_either_way() {
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();

        assert!(can_finalize_transfer(
            &admin(),
            from,
            to,
            TransferDecision::Complete
        ));
        assert!(can_finalize_transfer(
            &admin(),
            from,
            to,
            TransferDecision::Cancel
        ));
    }

    #[test]
    fn uninvolved_base_cannot_finalize_at_all() {
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        let bystander = commander_of(Uuid::new_v4());

        assert!(!can_finalize_transfer(
            &bystander,
            from,
            to,
            TransferDecision::Complete
        ));
        assert!(!can_finalize_transfer(
            &bystander,
            from,
            to,
            TransferDecision::Cancel
        ));
        assert!(ensure_can_finalize_transfer(
            &bystander,
            from,
            to,
            TransferDecision::Cancel
        )
        .is_err());
    }

    #[test]
    fn role_parses_from_storage_form() {
        use std::str::FromStr;
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("commander").unwrap(), Role::Commander);
        assert_eq!(Role::from_str("logistics").unwrap(), Role::Logistics);
        assert!(Role::from_str("quartermaster").is_err());
        assert_eq!(Role::Commander.to_string(), "commander");
    }
}
