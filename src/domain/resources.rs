// Copyright 2025 Cowboy AI, LLC.

//! Registry resources: domains and the contacts and hosts they link to.

use crate::domain::billing::GracePeriod;
use crate::entity::{BillingEventId, PollMessageId, RepoId};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// EPP status values used by this crate
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum StatusValue {
    /// No other status
    Ok,
    /// Delete requested; linking is prohibited
    PendingDelete,
    /// Held out of DNS by the registry
    ServerHold,
    /// Updates prohibited by the registry
    ServerUpdateProhibited,
    /// Transfers prohibited by the registry
    ServerTransferProhibited,
}

/// Role a contact plays on a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContactRole {
    /// Administrative contact
    Admin,
    /// Technical contact
    Tech,
    /// Billing contact
    Billing,
}

/// A contact reference on a command or domain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DomainContact {
    /// Role; `None` when the client omitted the type attribute
    pub role: Option<ContactRole>,
    /// Contact id
    pub contact_id: String,
}

impl DomainContact {
    /// A contact with a role
    pub fn new(role: ContactRole, contact_id: impl Into<String>) -> Self {
        Self {
            role: Some(role),
            contact_id: contact_id.into(),
        }
    }
}

/// A contact object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactResource {
    /// Contact id
    pub contact_id: String,
    /// Status set
    pub statuses: BTreeSet<StatusValue>,
}

impl ContactResource {
    /// An active contact
    pub fn active(contact_id: impl Into<String>) -> Self {
        Self {
            contact_id: contact_id.into(),
            statuses: BTreeSet::from([StatusValue::Ok]),
        }
    }

    /// Same contact with pending-delete added
    pub fn pending_delete(mut self) -> Self {
        self.statuses.insert(StatusValue::PendingDelete);
        self
    }
}

/// A host object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostResource {
    /// Fully qualified host name
    pub host_name: String,
    /// Status set
    pub statuses: BTreeSet<StatusValue>,
}

impl HostResource {
    /// An active host
    pub fn active(host_name: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            statuses: BTreeSet::from([StatusValue::Ok]),
        }
    }

    /// Same host with pending-delete added
    pub fn pending_delete(mut self) -> Self {
        self.statuses.insert(StatusValue::PendingDelete);
        self
    }
}

/// One DS record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DsRecord {
    /// Key tag
    pub key_tag: u16,
    /// Algorithm number
    pub algorithm: u8,
    /// Digest type
    pub digest_type: u8,
    /// Hex digest
    pub digest: String,
}

/// Trademark claims notice recorded on a domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchNotice {
    /// TCN id
    pub notice_id: String,
    /// Validator id, e.g. `tmch`
    pub validator_id: String,
    /// When the notice stops being valid
    pub expiration_time: DateTime<Utc>,
    /// When the registrant accepted it
    pub accepted_time: DateTime<Utc>,
}

/// A pending launch-phase application for a name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainApplication {
    /// Fully qualified name applied for
    pub domain_name: String,
    /// Whether the application was rejected
    pub rejected: bool,
}

/// A domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainResource {
    /// Registry object id
    pub repo_id: RepoId,
    /// Fully qualified name
    pub fully_qualified_domain_name: String,
    /// TLD
    pub tld: String,
    /// Sponsoring registrar
    pub current_sponsor_client_id: String,
    /// Creating registrar
    pub creation_client_id: String,
    /// Registrant contact id
    pub registrant: String,
    /// Role contacts
    pub contacts: BTreeSet<(ContactRole, String)>,
    /// Nameserver host names
    pub nameservers: BTreeSet<String>,
    /// DS records
    pub ds_data: BTreeSet<DsRecord>,
    /// Status set
    pub statuses: BTreeSet<StatusValue>,
    /// Auth info password
    pub auth_info: String,
    /// Creation time
    pub creation_time: DateTime<Utc>,
    /// Expiration time
    pub registration_expiration_time: DateTime<Utc>,
    /// Deletion time; `None` while live
    pub deletion_time: Option<DateTime<Utc>>,
    /// Grace periods in effect
    pub grace_periods: Vec<GracePeriod>,
    /// Recurring autorenew billing event
    pub autorenew_billing_event: BillingEventId,
    /// Autorenew poll message
    pub autorenew_poll_message: PollMessageId,
    /// Signed mark id when created with one
    pub smd_id: Option<String>,
    /// Claims notice when created with one
    pub launch_notice: Option<LaunchNotice>,
    /// IDN table the label was validated against, if any
    pub idn_table_name: Option<String>,
}

impl DomainResource {
    /// Whether the domain exists at `now`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.deletion_time.map_or(true, |deleted| deleted > now)
    }

    /// Whether the domain should be published to DNS
    pub fn should_publish_to_dns(&self) -> bool {
        !self.statuses.contains(&StatusValue::ServerHold)
    }
}
