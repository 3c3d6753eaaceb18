// Copyright 2025 Cowboy AI, LLC.

//! Registry domain model
//!
//! Immutable policy snapshots and value objects read by the flows, plus the entities a create
//! materialises: the domain resource, its history entry, billing events, grace period, poll
//! messages and the allocation token it may redeem.

pub mod billing;
pub mod history;
pub mod name;
pub mod policy;
pub mod poll;
pub mod registrar;
pub mod resources;
pub mod schedule;
pub mod token;
pub mod value_objects;

pub use billing::{
    BillingEvent, BillingFlag, BillingReason, GracePeriod, GracePeriodType, OneTimeEvent,
    RecurringEvent,
};
pub use history::{
    HistoryEntry, HistoryEntryType, HistoryMetadata, TransactionReportField,
    TransactionReportRecord,
};
pub use name::{parse_domain_name, DomainName, IdnTable};
pub use policy::{
    PolicyError, PremiumList, ReservationType, ReservedList, TldPhase, TldPolicySnapshot, TldType,
};
pub use poll::{AutorenewMessage, OneTimeMessage, PendingActionNotification, PollMessage};
pub use registrar::{Registrar, RegistrarState};
pub use resources::{
    ContactResource, ContactRole, DomainApplication, DomainContact, DomainResource, DsRecord,
    HostResource, LaunchNotice, StatusValue,
};
pub use schedule::TimedTransitions;
pub use token::{validate_token, AllocationToken, AlreadyRedeemed};
pub use value_objects::{Currency, Money, Period, PeriodUnit};
