// Copyright 2025 Cowboy AI, LLC.

//! Registry commands
//!
//! Commands arrive already decoded from the wire. Each optional extension is a typed field; the
//! URIs a command actually uses are derived from which fields are present, so the flow can check
//! them against what the session declared at login.

use crate::cqrs::Command;
use crate::domain::resources::{DomainContact, DsRecord};
use crate::domain::value_objects::Period;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Launch extension URI
pub const LAUNCH_EXTENSION_URI: &str = "urn:ietf:params:xml:ns:launch-1.0";
/// DNSSEC extension URI
pub const SEC_DNS_EXTENSION_URI: &str = "urn:ietf:params:xml:ns:secDNS-1.1";
/// Allocation token extension URI
pub const ALLOCATION_TOKEN_EXTENSION_URI: &str = "urn:ietf:params:xml:ns:allocationToken-1.0";
/// Tool-only metadata extension URI; never declared at login
pub const METADATA_EXTENSION_URI: &str = "urn:registry:params:xml:ns:metadata-1.0";

/// Fee extension wire version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeExtensionVersion {
    /// fee-0.6
    V06,
    /// fee-0.11
    V11,
    /// fee-0.12
    V12,
}

impl FeeExtensionVersion {
    /// Service URI the session must declare
    pub fn uri(&self) -> &'static str {
        match self {
            FeeExtensionVersion::V06 => "urn:ietf:params:xml:ns:fee-0.6",
            FeeExtensionVersion::V11 => "urn:ietf:params:xml:ns:fee-0.11",
            FeeExtensionVersion::V12 => "urn:ietf:params:xml:ns:fee-0.12",
        }
    }

    /// Version string, e.g. `0.11`
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeExtensionVersion::V06 => "0.6",
            FeeExtensionVersion::V11 => "0.11",
            FeeExtensionVersion::V12 => "0.12",
        }
    }
}

/// One declared fee line
///
/// Every fee extension version shares this line type. The version only selects the service URI
/// that must be declared at login and the shape of the response echo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredFee {
    /// Free-text description; must name exactly one fee category
    pub description: String,
    /// Declared amount
    pub amount: Decimal,
    /// `refundable` attribute, if sent
    pub refundable: Option<bool>,
    /// `grace-period` attribute, if sent
    pub grace_period: Option<String>,
    /// `applied` attribute, if sent
    pub applied: Option<String>,
}

impl DeclaredFee {
    /// A fee line without attributes
    pub fn new(description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            description: description.into(),
            amount,
            refundable: None,
            grace_period: None,
            applied: None,
        }
    }
}

/// Fee extension on a create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeCreateExtension {
    /// Wire version
    pub version: FeeExtensionVersion,
    /// Declared currency; the TLD currency when omitted
    pub currency: Option<String>,
    /// Fee lines
    pub fees: Vec<DeclaredFee>,
    /// Credit lines; creates never take credits
    pub credits: Vec<Decimal>,
}

impl FeeCreateExtension {
    /// A fee extension with the given lines
    pub fn new(version: FeeExtensionVersion, currency: Option<&str>, fees: Vec<DeclaredFee>) -> Self {
        Self {
            version,
            currency: currency.map(str::to_string),
            fees,
            credits: Vec::new(),
        }
    }
}

/// Launch phase named on the launch extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchPhase {
    /// Sunrise registration
    Sunrise,
    /// Claims registration
    Claims,
    /// Landrush registration
    Landrush,
    /// Open registration
    Open,
    /// Any other phase name
    Custom(String),
}

/// Claims notice acknowledgement sent by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsNotice {
    /// TCN id
    pub notice_id: String,
    /// Validator id
    pub validator_id: String,
    /// When the notice expires
    pub expiration_time: DateTime<Utc>,
    /// When the registrant accepted it
    pub accepted_time: DateTime<Utc>,
}

/// Launch extension on a create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchCreateExtension {
    /// Phase named by the client
    pub phase: LaunchPhase,
    /// Encoded signed mark data
    pub signed_marks: Vec<String>,
    /// Code marks
    pub code_marks: Vec<String>,
    /// Claims notice
    pub notice: Option<ClaimsNotice>,
}

impl LaunchCreateExtension {
    /// A launch extension in the given phase with nothing attached
    pub fn new(phase: LaunchPhase) -> Self {
        Self {
            phase,
            signed_marks: Vec::new(),
            code_marks: Vec::new(),
            notice: None,
        }
    }
}

/// DNSSEC extension on a create
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecDnsCreateExtension {
    /// Requested maximum signature lifetime
    pub max_sig_life: Option<u64>,
    /// DS records
    pub ds_data: Vec<DsRecord>,
}

/// Tool-only metadata extension
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataExtension {
    /// Reason recorded on the history entry
    pub reason: Option<String>,
    /// Whether the registrar asked for the change
    pub requested_by_registrar: Option<bool>,
    /// Create as an anchor tenant
    pub anchor_tenant: bool,
}

/// Extensions attached to a create
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateExtensions {
    /// Fee extension
    pub fee: Option<FeeCreateExtension>,
    /// Launch extension
    pub launch: Option<LaunchCreateExtension>,
    /// DNSSEC extension
    pub sec_dns: Option<SecDnsCreateExtension>,
    /// Allocation token string
    pub allocation_token: Option<String>,
    /// Metadata extension
    pub metadata: Option<MetadataExtension>,
    /// URIs of extensions the decoder recognised but this command does not implement
    pub unimplemented: Vec<String>,
}

impl CreateExtensions {
    /// URIs of the extensions present, metadata excluded
    pub fn used_service_uris(&self) -> Vec<&'static str> {
        let mut uris = Vec::new();
        if let Some(fee) = &self.fee {
            uris.push(fee.version.uri());
        }
        if self.launch.is_some() {
            uris.push(LAUNCH_EXTENSION_URI);
        }
        if self.sec_dns.is_some() {
            uris.push(SEC_DNS_EXTENSION_URI);
        }
        if self.allocation_token.is_some() {
            uris.push(ALLOCATION_TOKEN_EXTENSION_URI);
        }
        uris
    }
}

/// `<domain:create>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainCreateCommand {
    /// Fully qualified name as sent
    pub fully_qualified_domain_name: String,
    /// Requested period; one year when omitted
    pub period: Option<Period>,
    /// Nameserver host names
    pub nameservers: Vec<String>,
    /// Registrant contact id
    pub registrant: Option<String>,
    /// Role contacts
    pub contacts: Vec<DomainContact>,
    /// Auth info password; also matched against allocation tokens
    pub auth_info: String,
    /// Extensions
    pub extensions: CreateExtensions,
}

impl DomainCreateCommand {
    /// A create with no contacts, hosts or extensions
    pub fn new(name: impl Into<String>, auth_info: impl Into<String>) -> Self {
        Self {
            fully_qualified_domain_name: name.into(),
            period: None,
            nameservers: Vec::new(),
            registrant: None,
            contacts: Vec::new(),
            auth_info: auth_info.into(),
            extensions: CreateExtensions::default(),
        }
    }

    /// Name exactly as sent; case is not folded
    pub fn name(&self) -> &str {
        &self.fully_qualified_domain_name
    }

    /// DS records from the DNSSEC extension
    pub fn ds_data(&self) -> &[DsRecord] {
        self.extensions
            .sec_dns
            .as_ref()
            .map_or(&[][..], |sec_dns| sec_dns.ds_data.as_slice())
    }

    /// Signed marks from the launch extension
    pub fn signed_marks(&self) -> &[String] {
        self.extensions
            .launch
            .as_ref()
            .map_or(&[][..], |launch| launch.signed_marks.as_slice())
    }

    /// Claims notice from the launch extension
    pub fn claims_notice(&self) -> Option<&ClaimsNotice> {
        self.extensions
            .launch
            .as_ref()
            .and_then(|launch| launch.notice.as_ref())
    }
}

/// Marker for the domain aggregate targeted by creates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainAggregate;

impl Command for DomainCreateCommand {
    type Aggregate = DomainAggregate;

    fn target_name(&self) -> &str {
        &self.fully_qualified_domain_name
    }
}
