// Copyright 2025 Cowboy AI, LLC.

//! TLD policy snapshots.
//!
//! A [`TldPolicySnapshot`] is an immutable view of one TLD's configuration as of the moment a
//! flow loaded it. The `with_*` methods return a new snapshot; nothing mutates a snapshot that a
//! flow is already reading.

use crate::domain::name::IdnTable;
use crate::domain::schedule::TimedTransitions;
use crate::domain::value_objects::{Currency, Money};
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle phase of a TLD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TldPhase {
    /// Not yet delegated
    Predelegation,
    /// End-date sunrise: applications only
    Sunrise,
    /// Start-date sunrise: creates require a signed mark
    StartDateSunrise,
    /// Combined sunrise and landrush
    Sunrush,
    /// Landrush applications
    Landrush,
    /// No registrations
    QuietPeriod,
    /// General availability
    GeneralAvailability,
}

impl TldPhase {
    /// Upper-case wire name
    pub fn name(&self) -> &'static str {
        match self {
            TldPhase::Predelegation => "PREDELEGATION",
            TldPhase::Sunrise => "SUNRISE",
            TldPhase::StartDateSunrise => "START_DATE_SUNRISE",
            TldPhase::Sunrush => "SUNRUSH",
            TldPhase::Landrush => "LANDRUSH",
            TldPhase::QuietPeriod => "QUIET_PERIOD",
            TldPhase::GeneralAvailability => "GENERAL_AVAILABILITY",
        }
    }

    /// Phases in which signed marks may be used
    pub fn is_sunrise(&self) -> bool {
        matches!(
            self,
            TldPhase::Sunrise | TldPhase::StartDateSunrise | TldPhase::Sunrush
        )
    }
}

/// Why a name is on a reserved list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationType {
    /// Creatable only with the listed nameservers
    NameserverRestricted,
    /// Creatable, but held out of DNS
    NameCollision,
    /// Creatable by an anchor tenant with a matching token
    ReservedForAnchorTenant,
    /// Creatable with a token bound to the name
    ReservedForSpecificUse,
    /// Not creatable
    FullyBlocked,
}

impl ReservationType {
    /// Types that stop a create unless an override applies
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            ReservationType::FullyBlocked
                | ReservationType::ReservedForSpecificUse
                | ReservationType::ReservedForAnchorTenant
        )
    }
}

impl FromStr for ReservationType {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NAMESERVER_RESTRICTED" => Ok(ReservationType::NameserverRestricted),
            "NAME_COLLISION" => Ok(ReservationType::NameCollision),
            "RESERVED_FOR_ANCHOR_TENANT" => Ok(ReservationType::ReservedForAnchorTenant),
            "RESERVED_FOR_SPECIFIC_USE" => Ok(ReservationType::ReservedForSpecificUse),
            "FULLY_BLOCKED" => Ok(ReservationType::FullyBlocked),
            other => Err(PolicyError::UnknownReservationType(other.to_string())),
        }
    }
}

/// Errors building policy objects
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// Reserved list line names an unknown type
    #[error("Unknown reservation type: {0}")]
    UnknownReservationType(String),

    /// Reserved list line is not `label,TYPE[,ns1:ns2...]`
    #[error("Malformed reserved list line: {0}")]
    MalformedLine(String),

    /// Nameservers given for a type other than NAMESERVER_RESTRICTED
    #[error("Only NAMESERVER_RESTRICTED entries may list nameservers: {0}")]
    UnexpectedNameservers(String),
}

/// One reserved-list entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedEntry {
    /// Reservation type
    pub reservation_type: ReservationType,
    /// Allowed nameservers, only for NAMESERVER_RESTRICTED
    pub allowed_nameservers: BTreeSet<String>,
}

/// A named reserved list: label → entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedList {
    /// List name
    pub name: String,
    entries: IndexMap<String, ReservedEntry>,
}

impl ReservedList {
    /// Parse lines of the form `label,TYPE` or `label,NAMESERVER_RESTRICTED,ns1:ns2`.
    pub fn parse<'a>(
        name: impl Into<String>,
        lines: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, PolicyError> {
        let mut entries = IndexMap::new();
        for line in lines {
            let parts: Vec<&str> = line.split(',').map(str::trim).collect();
            let (label, kind, hosts) = match parts.as_slice() {
                [label, kind] => (*label, *kind, None),
                [label, kind, hosts] => (*label, *kind, Some(*hosts)),
                _ => return Err(PolicyError::MalformedLine(line.to_string())),
            };
            if label.is_empty() {
                return Err(PolicyError::MalformedLine(line.to_string()));
            }
            let reservation_type: ReservationType = kind.parse()?;
            let allowed_nameservers: BTreeSet<String> = match hosts {
                Some(hosts) if reservation_type == ReservationType::NameserverRestricted => hosts
                    .split(':')
                    .filter(|h| !h.is_empty())
                    .map(str::to_string)
                    .collect(),
                Some(_) => return Err(PolicyError::UnexpectedNameservers(line.to_string())),
                None => BTreeSet::new(),
            };
            entries.insert(
                label.to_string(),
                ReservedEntry {
                    reservation_type,
                    allowed_nameservers,
                },
            );
        }
        Ok(Self {
            name: name.into(),
            entries,
        })
    }

    /// Entry for a label
    pub fn get(&self, label: &str) -> Option<&ReservedEntry> {
        self.entries.get(label)
    }
}

/// Whether billing applies to the TLD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TldType {
    /// Production TLD
    Real,
    /// Test TLD; no transaction reporting
    Test,
}

/// Yearly premium prices by label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumList {
    prices: IndexMap<String, Money>,
}

impl PremiumList {
    /// Build from `(label, yearly price)` pairs
    pub fn new(prices: impl IntoIterator<Item = (String, Money)>) -> Self {
        Self {
            prices: prices.into_iter().collect(),
        }
    }

    /// Yearly premium price for a label
    pub fn price_for(&self, label: &str) -> Option<&Money> {
        self.prices.get(label)
    }
}

/// Snapshot of a TLD's configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TldPolicySnapshot {
    /// TLD name, possibly multi-part (e.g. `foo.tld`)
    pub name: String,
    /// Suffix for repo ids
    pub roid_suffix: String,
    /// Real or test
    pub tld_type: TldType,
    /// Phase schedule
    pub phase_transitions: TimedTransitions<TldPhase>,
    /// Billing currency
    pub currency: Currency,
    /// Standard create cost per year
    pub create_cost_per_year: Money,
    /// EAP fee schedule
    pub eap_fee_schedule: TimedTransitions<Money>,
    /// Premium prices
    pub premium_list: PremiumList,
    /// Premium names need a fee extension
    pub premium_price_ack_required: bool,
    /// Reserved lists consulted for every create
    pub reserved_lists: Vec<ReservedList>,
    /// Claims notices are required before this time
    pub claims_period_end: DateTime<Utc>,
    /// Standard add grace period
    pub add_grace_period: Duration,
    /// Add grace period for anchor tenants
    pub anchor_tenant_add_grace_period: Duration,
    /// Registrant allow-list; empty means any
    pub allowed_registrant_contact_ids: BTreeSet<String>,
    /// Nameserver allow-list; empty means any
    pub allowed_fully_qualified_host_names: BTreeSet<String>,
    /// Only NAMESERVER_RESTRICTED names may be created
    pub domain_create_restricted: bool,
    /// Per-TLD cap on registration years
    pub max_registration_years: Option<u32>,
    /// IDN tables a decoded label must fit
    pub idn_tables: Vec<IdnTable>,
}

impl TldPolicySnapshot {
    /// A GA, USD-priced TLD with the usual defaults
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let roid_suffix = name.replace('.', "_").to_ascii_uppercase();
        let currency = Currency::usd();
        Self {
            name,
            roid_suffix,
            tld_type: TldType::Real,
            phase_transitions: TimedTransitions::constant(TldPhase::GeneralAvailability),
            create_cost_per_year: Money::from_major(13, currency.clone()),
            eap_fee_schedule: TimedTransitions::constant(Money::zero(currency.clone())),
            currency,
            premium_list: PremiumList::default(),
            premium_price_ack_required: true,
            reserved_lists: Vec::new(),
            claims_period_end: DateTime::<Utc>::MAX_UTC,
            add_grace_period: Duration::days(5),
            anchor_tenant_add_grace_period: Duration::days(30),
            allowed_registrant_contact_ids: BTreeSet::new(),
            allowed_fully_qualified_host_names: BTreeSet::new(),
            domain_create_restricted: false,
            max_registration_years: None,
            idn_tables: vec![IdnTable::ExtendedLatin, IdnTable::Japanese],
        }
    }

    /// Same snapshot with a single phase for all time
    pub fn with_phase(self, phase: TldPhase) -> Self {
        self.with_phase_transitions(TimedTransitions::constant(phase))
    }

    /// Same snapshot with a phase schedule
    pub fn with_phase_transitions(mut self, transitions: TimedTransitions<TldPhase>) -> Self {
        self.phase_transitions = transitions;
        self
    }

    /// Same snapshot with a different currency; prices are re-denominated at face value
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.create_cost_per_year =
            Money::from_minor(self.create_cost_per_year.amount_minor(), currency.clone());
        self.eap_fee_schedule = TimedTransitions::constant(Money::zero(currency.clone()));
        self.currency = currency;
        self
    }

    /// Same snapshot with a different yearly create cost
    pub fn with_create_cost_per_year(mut self, cost: Money) -> Self {
        self.create_cost_per_year = cost;
        self
    }

    /// Same snapshot with an EAP schedule
    pub fn with_eap_fee_schedule(mut self, schedule: TimedTransitions<Money>) -> Self {
        self.eap_fee_schedule = schedule;
        self
    }

    /// Same snapshot with a premium list
    pub fn with_premium_list(mut self, list: PremiumList) -> Self {
        self.premium_list = list;
        self
    }

    /// Same snapshot with the premium acknowledgement flag set
    pub fn with_premium_price_ack_required(mut self, required: bool) -> Self {
        self.premium_price_ack_required = required;
        self
    }

    /// Same snapshot with these reserved lists
    pub fn with_reserved_lists(mut self, lists: Vec<ReservedList>) -> Self {
        self.reserved_lists = lists;
        self
    }

    /// Same snapshot with a claims period end
    pub fn with_claims_period_end(mut self, end: DateTime<Utc>) -> Self {
        self.claims_period_end = end;
        self
    }

    /// Same snapshot with a registrant allow-list
    pub fn with_allowed_registrants(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.allowed_registrant_contact_ids = ids.into_iter().collect();
        self
    }

    /// Same snapshot with a nameserver allow-list
    pub fn with_allowed_nameservers(mut self, hosts: impl IntoIterator<Item = String>) -> Self {
        self.allowed_fully_qualified_host_names = hosts.into_iter().collect();
        self
    }

    /// Same snapshot with the create restriction flag set
    pub fn with_domain_create_restricted(mut self, restricted: bool) -> Self {
        self.domain_create_restricted = restricted;
        self
    }

    /// Same snapshot with a TLD type
    pub fn with_tld_type(mut self, tld_type: TldType) -> Self {
        self.tld_type = tld_type;
        self
    }

    /// Same snapshot with a registration-year cap
    pub fn with_max_registration_years(mut self, years: u32) -> Self {
        self.max_registration_years = Some(years);
        self
    }

    /// Phase in force at `now`
    pub fn phase_at(&self, now: DateTime<Utc>) -> TldPhase {
        self.phase_transitions
            .value_at(now)
            .copied()
            .unwrap_or(TldPhase::Predelegation)
    }

    /// EAP fee in force at `now`; zero before the first entry
    pub fn eap_fee_at(&self, now: DateTime<Utc>) -> Money {
        self.eap_fee_schedule
            .value_at(now)
            .cloned()
            .unwrap_or_else(|| Money::zero(self.currency.clone()))
    }

    /// When the EAP fee in force at `now` stops applying
    pub fn eap_fee_period_end(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.eap_fee_schedule.next_transition_after(now)
    }

    /// Every reservation type recorded for a label across all lists
    pub fn reservation_types(&self, label: &str) -> BTreeSet<ReservationType> {
        self.reserved_lists
            .iter()
            .filter_map(|list| list.get(label))
            .map(|entry| entry.reservation_type)
            .collect()
    }

    /// Nameservers allowed for a nameserver-restricted label: the intersection across lists.
    pub fn allowed_nameservers_for(&self, label: &str) -> Option<BTreeSet<String>> {
        self.reserved_lists
            .iter()
            .filter_map(|list| list.get(label))
            .filter(|entry| entry.reservation_type == ReservationType::NameserverRestricted)
            .map(|entry| entry.allowed_nameservers.clone())
            .reduce(|acc, next| acc.intersection(&next).cloned().collect())
    }

    /// Yearly premium price, if the label is premium
    pub fn premium_price(&self, label: &str) -> Option<&Money> {
        self.premium_list.price_for(label)
    }

    /// Effective registration-year cap
    pub fn registration_year_cap(&self, registry_max: u32) -> u32 {
        self.max_registration_years
            .map_or(registry_max, |tld_max| tld_max.min(registry_max))
    }
}
