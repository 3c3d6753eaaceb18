// Copyright 2025 Cowboy AI, LLC.

//! Entity materialisation for a validated create
//!
//! Builds, in memory, everything one create persists: the domain resource, the history entry that
//! owns the rest, the billing events, the ADD grace period and the poll messages. Nothing here
//! touches the store; the coordinator hands the result to the commit.

use crate::commands::DomainCreateCommand;
use crate::config::FlowConfig;
use crate::cqrs::{SessionMetadata, Trid};
use crate::domain::billing::{
    BillingEvent, BillingFlag, BillingReason, GracePeriod, OneTimeEvent, RecurringEvent,
};
use crate::domain::history::{
    HistoryEntry, HistoryEntryType, HistoryMetadata, TransactionReportField,
    TransactionReportRecord,
};
use crate::domain::policy::{TldPolicySnapshot, TldType};
use crate::domain::poll::{
    AutorenewMessage, OneTimeMessage, PendingActionNotification, PollMessage,
};
use crate::domain::resources::{DomainResource, StatusValue};
use crate::entity::{BillingEventId, HistoryEntryId, PollMessageId, RepoId};
use crate::pricing::CreatePrice;
use crate::validation::ValidatedCreate;
use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Inputs to materialisation
#[derive(Clone, Copy)]
pub struct CreateContext<'a> {
    /// The command
    pub command: &'a DomainCreateCommand,
    /// Session it arrived on
    pub session: &'a SessionMetadata,
    /// Transaction ids
    pub trid: &'a Trid,
    /// Registry-wide settings
    pub config: &'a FlowConfig,
    /// Policy of the name's TLD
    pub tld: &'a TldPolicySnapshot,
    /// Pipeline result
    pub validated: &'a ValidatedCreate,
    /// Reconciled price
    pub price: &'a CreatePrice,
    /// Transaction time
    pub now: DateTime<Utc>,
}

/// Everything one create writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterializedCreate {
    /// The new domain
    pub domain: DomainResource,
    /// Transactional root
    pub history: HistoryEntry,
    /// One-time and recurring events, CREATE first
    pub billing_events: Vec<BillingEvent>,
    /// Autorenew message first, then one-time messages
    pub poll_messages: Vec<PollMessage>,
}

impl MaterializedCreate {
    /// The CREATE one-time event
    pub fn create_event(&self) -> Option<&OneTimeEvent> {
        self.billing_events
            .iter()
            .filter_map(BillingEvent::as_one_time)
            .find(|event| event.reason == BillingReason::Create)
    }

    /// Events with a given reason
    pub fn events_for(&self, reason: BillingReason) -> Vec<&BillingEvent> {
        self.billing_events
            .iter()
            .filter(|event| event.reason() == reason)
            .collect()
    }

    /// Append a one-time poll message under the same history entry
    pub fn push_message(&mut self, message: OneTimeMessage) {
        self.poll_messages.push(PollMessage::OneTime(message));
    }
}

/// `now` plus whole years; saturates at the end of time
pub fn expiration_after(now: DateTime<Utc>, years: u32) -> DateTime<Utc> {
    years
        .checked_mul(12)
        .and_then(|months| now.checked_add_months(Months::new(months)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Build the domain, history, billing events and poll messages for a create.
pub fn materialize(ctx: &CreateContext<'_>) -> MaterializedCreate {
    let validated = ctx.validated;
    let now = ctx.now;
    let fqdn = validated.fqdn();
    let client_id = ctx.session.registrar_id.clone();
    let history_id = HistoryEntryId::new();
    let expiration = expiration_after(now, validated.years);

    let grace_length = if validated.is_anchor_tenant() {
        ctx.tld.anchor_tenant_add_grace_period
    } else {
        ctx.tld.add_grace_period
    };
    let mut flags = BTreeSet::new();
    if validated.is_anchor_tenant() {
        flags.insert(BillingFlag::AnchorTenant);
    }
    if validated.signed_mark.is_some() {
        flags.insert(BillingFlag::Sunrise);
    }

    let one_time = |reason, cost, period_years| OneTimeEvent {
        id: BillingEventId::new(),
        reason,
        client_id: client_id.clone(),
        target_id: fqdn.clone(),
        cost,
        period_years,
        event_time: now,
        billing_time: now + grace_length,
        flags: flags.clone(),
        parent: history_id,
    };
    let create_event = one_time(
        BillingReason::Create,
        ctx.price.create_cost.clone(),
        validated.years,
    );
    let grace_period = GracePeriod::for_add(&create_event);
    let mut billing_events = vec![BillingEvent::OneTime(create_event)];
    if !ctx.price.eap_fee.is_zero() {
        billing_events.push(BillingEvent::OneTime(one_time(
            BillingReason::FeeEarlyAccess,
            ctx.price.eap_fee.clone(),
            1,
        )));
    }
    let autorenew_event = RecurringEvent {
        id: BillingEventId::new(),
        reason: BillingReason::Renew,
        client_id: client_id.clone(),
        target_id: fqdn.clone(),
        event_time: expiration,
        recurrence_end_time: DateTime::<Utc>::MAX_UTC,
        flags: BTreeSet::from([BillingFlag::AutoRenew]),
        parent: history_id,
    };
    let autorenew_event_id = autorenew_event.id;
    billing_events.push(BillingEvent::Recurring(autorenew_event));

    let autorenew_message = AutorenewMessage {
        id: PollMessageId::new(),
        client_id: client_id.clone(),
        target_id: fqdn.clone(),
        event_time: expiration,
        autorenew_end_time: DateTime::<Utc>::MAX_UTC,
        message: ctx.config.autorenew_message.clone(),
        parent: history_id,
    };
    let autorenew_message_id = autorenew_message.id;
    let mut poll_messages = vec![PollMessage::Autorenew(autorenew_message)];
    if validated.name_collision {
        poll_messages.push(PollMessage::OneTime(OneTimeMessage {
            id: PollMessageId::new(),
            client_id: client_id.clone(),
            event_time: now,
            message: ctx.config.collision_message.clone(),
            response_data: vec![PendingActionNotification {
                name: fqdn.clone(),
                action_result: true,
                trid: ctx.trid.to_string(),
                processed_date: now,
            }],
            parent: history_id,
        }));
    }

    let command = ctx.command;
    let domain = DomainResource {
        repo_id: RepoId::generate(&ctx.tld.roid_suffix),
        fully_qualified_domain_name: fqdn.clone(),
        tld: validated.name.tld().to_string(),
        current_sponsor_client_id: client_id.clone(),
        creation_client_id: client_id.clone(),
        registrant: command.registrant.clone().unwrap_or_default(),
        contacts: command
            .contacts
            .iter()
            .filter_map(|contact| contact.role.map(|role| (role, contact.contact_id.clone())))
            .collect(),
        nameservers: command.nameservers.iter().cloned().collect(),
        ds_data: command.ds_data().iter().cloned().collect(),
        statuses: initial_statuses(validated),
        auth_info: command.auth_info.clone(),
        creation_time: now,
        registration_expiration_time: expiration,
        deletion_time: None,
        grace_periods: vec![grace_period],
        autorenew_billing_event: autorenew_event_id,
        autorenew_poll_message: autorenew_message_id,
        smd_id: validated.signed_mark.as_ref().map(|mark| mark.id.clone()),
        launch_notice: validated.launch_notice.clone(),
        idn_table_name: validated.idn_table.map(|table| table.name().to_string()),
    };

    let metadata = command
        .extensions
        .metadata
        .as_ref()
        .map(|metadata| HistoryMetadata {
            reason: metadata.reason.clone(),
            requested_by_registrar: metadata.requested_by_registrar,
        })
        .unwrap_or_default();
    let transaction_records = match ctx.tld.tld_type {
        TldType::Test => Vec::new(),
        TldType::Real => vec![TransactionReportRecord {
            tld: ctx.tld.name.clone(),
            reporting_time: now + ctx.tld.add_grace_period,
            field: TransactionReportField::NetAdds {
                years: validated.years,
            },
            amount: 1,
        }],
    };
    let history = HistoryEntry {
        id: history_id,
        entry_type: HistoryEntryType::DomainCreate,
        target_id: fqdn,
        period_years: validated.years,
        modification_time: now,
        client_id,
        trid: ctx.trid.to_string(),
        by_superuser: ctx.session.is_superuser,
        metadata,
        transaction_records,
    };

    MaterializedCreate {
        domain,
        history,
        billing_events,
        poll_messages,
    }
}

fn initial_statuses(validated: &ValidatedCreate) -> BTreeSet<StatusValue> {
    let mut statuses = BTreeSet::new();
    if validated.name_collision {
        statuses.insert(StatusValue::ServerHold);
    }
    if validated.create_restricted {
        statuses.insert(StatusValue::ServerUpdateProhibited);
        statuses.insert(StatusValue::ServerTransferProhibited);
    }
    if statuses.is_empty() {
        statuses.insert(StatusValue::Ok);
    }
    statuses
}
