//! Structured list filters.
//!
//! Record listings accept an enumerated set of filter keys (base, equipment
//! type, date range) that are translated into sea-orm conditions. Filters are
//! never assembled from strings.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sea_orm::{ColumnTrait, Condition};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::auth::policy::Actor;

/// Filter keys recognized by ledger record listings.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecordFilter {
    /// Restrict to one base (admins only; other roles are always scoped to
    /// their home base)
    pub base_id: Option<Uuid>,
    /// Restrict to one equipment type
    pub equipment_type_id: Option<Uuid>,
    /// Inclusive first day of the window (UTC)
    pub start_date: Option<NaiveDate>,
    /// Inclusive last day of the window (UTC)
    pub end_date: Option<NaiveDate>,
}

impl RecordFilter {
    /// The base the actor is allowed to see, if any restriction applies.
    ///
    /// Base-scoped actors always see their home base regardless of the
    /// requested filter; admins see the requested base or everything.
    pub fn visible_base(&self, actor: &Actor) -> Option<Uuid> {
        if actor.role.is_global() {
            self.base_id
        } else {
            actor.base_id
        }
    }

    /// Half-open UTC instant bounds for the requested day window.
    pub fn date_bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let start = self
            .start_date
            .map(|d| d.and_hms_opt(0, 0, 0).expect("midnight is valid").and_utc());
        let end = self.end_date.map(|d| {
            (d + Duration::days(1))
                .and_hms_opt(0, 0, 0)
                .expect("midnight is valid")
                .and_utc()
        });
        (start, end)
    }

    /// Condition over a single-base record (purchases, assignments,
    /// balances). `date_column` carries the record's business date.
    pub fn to_condition<C>(
        &self,
        actor: &Actor,
        base_column: C,
        equipment_column: C,
        date_column: C,
    ) -> Condition
    where
        C: ColumnTrait,
    {
        let mut condition = Condition::all();

        if let Some(base_id) = self.visible_base(actor) {
            condition = condition.add(base_column.eq(base_id));
        }
        if let Some(equipment_type_id) = self.equipment_type_id {
            condition = condition.add(equipment_column.eq(equipment_type_id));
        }

        let (start, end) = self.date_bounds();
        if let Some(start) = start {
            condition = condition.add(date_column.gte(start));
        }
        if let Some(end) = end {
            condition = condition.add(date_column.lt(end));
        }

        condition
    }

    /// Condition over transfers, where the base restriction matches either
    /// endpoint (a base sees what it sent and what it is receiving).
    pub fn to_transfer_condition<C>(
        &self,
        actor: &Actor,
        from_base_column: C,
        to_base_column: C,
        equipment_column: C,
        date_column: C,
    ) -> Condition
    where
        C: ColumnTrait,
    {
        let mut condition = Condition::all();

        if let Some(base_id) = self.visible_base(actor) {
            condition = condition.add(
                Condition::any()
                    .add(from_base_column.eq(base_id))
                    .add(to_base_column.eq(base_id)),
            );
        }
        if let Some(equipment_type_id) = self.equipment_type_id {
            condition = condition.add(equipment_column.eq(equipment_type_id));
        }

        let (start, end) = self.date_bounds();
        if let Some(start) = start {
            condition = condition.add(date_column.gte(start));
        }
        if let Some(end) = end {
            condition = condition.add(date_column.lt(end));
        }

        condition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::policy::Role;

    #[test]
    fn base_scoped_actor_is_pinned_to_home_base() {
        let home = Uuid::new_v4();
        let requested = Uuid::new_v4();
        let actor = Actor::new(Uuid::new_v4(), Role::Logistics, Some(home));

        let filter = RecordFilter {
            base_id: Some(requested),
            ..Default::default()
        };

        assert_eq!(filter.visible_base(&actor), Some(home));
    }

    #[test]
    fn admin_sees_requested_base_or_everything() {
        let requested = Uuid::new_v4();
        let actor = Actor::new(Uuid::new_v4(), Role::Admin, None);

        let filter = RecordFilter {
            base_id: Some(requested),
            ..Default::default()
        };
        assert_eq!(filter.visible_base(&actor), Some(requested));

        let unfiltered = RecordFilter::default();
        assert_eq!(unfiltered.visible_base(&actor), None);
    }

    #[test]
    fn date_bounds_cover_the_whole_last_day() {
        let filter = RecordFilter {
            start_date: Some(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            end_date: Some(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()),
            ..Default::default()
        };

        let (start, end) = filter.date_bounds();
        let start = start.unwrap();
        let end = end.unwrap();

        assert_eq!(start.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        // Half-open upper bound: first instant of the following day
        assert_eq!(end.to_rfc3339(), "2024-03-03T00:00:00+00:00");
    }
}
