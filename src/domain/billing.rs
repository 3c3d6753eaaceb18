// Copyright 2025 Cowboy AI, LLC.

//! Billing events and grace periods.
//!
//! A create produces one-time events (CREATE, and FEE_EARLY_ACCESS while EAP is on), one recurring
//! RENEW event for autorenew, and an ADD grace period pointing at the CREATE event.

use crate::domain::value_objects::Money;
use crate::entity::{BillingEventId, HistoryEntryId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Why an event is billed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingReason {
    /// Domain create
    Create,
    /// Early access program surcharge
    FeeEarlyAccess,
    /// Renewal, including autorenew
    Renew,
}

/// Flags attached to billing events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingFlag {
    /// Created by an anchor tenant
    AnchorTenant,
    /// Created with a signed mark
    Sunrise,
    /// Recurring autorenew
    AutoRenew,
}

/// A one-time charge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneTimeEvent {
    /// Event id
    pub id: BillingEventId,
    /// Reason
    pub reason: BillingReason,
    /// Registrar billed
    pub client_id: String,
    /// Domain name
    pub target_id: String,
    /// Amount charged
    pub cost: Money,
    /// Years covered
    pub period_years: u32,
    /// When the charge happened
    pub event_time: DateTime<Utc>,
    /// When the charge becomes final
    pub billing_time: DateTime<Utc>,
    /// Flags
    pub flags: BTreeSet<BillingFlag>,
    /// Owning history entry
    pub parent: HistoryEntryId,
}

/// A charge that recurs yearly from `event_time` until `recurrence_end_time`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringEvent {
    /// Event id
    pub id: BillingEventId,
    /// Reason
    pub reason: BillingReason,
    /// Registrar billed
    pub client_id: String,
    /// Domain name
    pub target_id: String,
    /// First occurrence
    pub event_time: DateTime<Utc>,
    /// End of recurrence; `DateTime::MAX_UTC` for unbounded
    pub recurrence_end_time: DateTime<Utc>,
    /// Flags
    pub flags: BTreeSet<BillingFlag>,
    /// Owning history entry
    pub parent: HistoryEntryId,
}

/// A billing event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingEvent {
    /// One-time charge
    OneTime(OneTimeEvent),
    /// Recurring charge
    Recurring(RecurringEvent),
}

impl BillingEvent {
    /// Event id
    pub fn id(&self) -> BillingEventId {
        match self {
            BillingEvent::OneTime(event) => event.id,
            BillingEvent::Recurring(event) => event.id,
        }
    }

    /// Reason
    pub fn reason(&self) -> BillingReason {
        match self {
            BillingEvent::OneTime(event) => event.reason,
            BillingEvent::Recurring(event) => event.reason,
        }
    }

    /// Owning history entry
    pub fn parent(&self) -> HistoryEntryId {
        match self {
            BillingEvent::OneTime(event) => event.parent,
            BillingEvent::Recurring(event) => event.parent,
        }
    }

    /// Flags
    pub fn flags(&self) -> &BTreeSet<BillingFlag> {
        match self {
            BillingEvent::OneTime(event) => &event.flags,
            BillingEvent::Recurring(event) => &event.flags,
        }
    }

    /// The one-time payload, if this is one
    pub fn as_one_time(&self) -> Option<&OneTimeEvent> {
        match self {
            BillingEvent::OneTime(event) => Some(event),
            BillingEvent::Recurring(_) => None,
        }
    }
}

/// Kind of grace period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GracePeriodType {
    /// After a create
    Add,
}

/// A window in which the action can be undone for a refund
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GracePeriod {
    /// Kind
    pub grace_period_type: GracePeriodType,
    /// When the window closes
    pub expiration_time: DateTime<Utc>,
    /// Registrar that gets the refund
    pub client_id: String,
    /// The one-time event refunded if the action is undone
    pub billing_event: BillingEventId,
}

impl GracePeriod {
    /// An ADD grace period for a one-time event; it closes when the event bills.
    pub fn for_add(event: &OneTimeEvent) -> Self {
        Self {
            grace_period_type: GracePeriodType::Add,
            expiration_time: event.billing_time,
            client_id: event.client_id.clone(),
            billing_event: event.id,
        }
    }

    /// Whether the referenced event is a persisted one-time CREATE or EAP event
    pub fn references_billable(&self, events: &[BillingEvent]) -> bool {
        events.iter().any(|event| {
            event.id() == self.billing_event
                && matches!(
                    event.as_one_time().map(|e| e.reason),
                    Some(BillingReason::Create) | Some(BillingReason::FeeEarlyAccess)
                )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Currency;
    use chrono::Duration;

    fn create_event(parent: HistoryEntryId, now: DateTime<Utc>) -> OneTimeEvent {
        OneTimeEvent {
            id: BillingEventId::new(),
            reason: BillingReason::Create,
            client_id: "TheRegistrar".into(),
            target_id: "example.tld".into(),
            cost: Money::from_major(26, Currency::usd()),
            period_years: 2,
            event_time: now,
            billing_time: now + Duration::days(5),
            flags: BTreeSet::new(),
            parent,
        }
    }

    #[test]
    fn test_add_grace_period_tracks_billing_time() {
        let now = Utc::now();
        let event = create_event(HistoryEntryId::new(), now);
        let grace = GracePeriod::for_add(&event);
        assert_eq!(grace.expiration_time, now + Duration::days(5));
        assert_eq!(grace.billing_event, event.id);
        assert_eq!(grace.grace_period_type, GracePeriodType::Add);
    }

    #[test]
    fn test_grace_period_must_reference_one_time_event() {
        let parent = HistoryEntryId::new();
        let now = Utc::now();
        let one_time = create_event(parent, now);
        let recurring = RecurringEvent {
            id: BillingEventId::new(),
            reason: BillingReason::Renew,
            client_id: "TheRegistrar".into(),
            target_id: "example.tld".into(),
            event_time: now,
            recurrence_end_time: DateTime::<Utc>::MAX_UTC,
            flags: BTreeSet::from([BillingFlag::AutoRenew]),
            parent,
        };
        let events = vec![
            BillingEvent::OneTime(one_time.clone()),
            BillingEvent::Recurring(recurring.clone()),
        ];

        assert!(GracePeriod::for_add(&one_time).references_billable(&events));

        let dangling = GracePeriod {
            billing_event: recurring.id,
            ..GracePeriod::for_add(&one_time)
        };
        assert!(!dangling.references_billable(&events));
    }
}
