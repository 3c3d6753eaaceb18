// Copyright 2025 Cowboy AI, LLC.

//! Ordered validation pipeline for domain creates
//!
//! Validation runs in two stages over data the coordinator has already loaded:
//!
//! 1. **Target resolution**: extension declarations, name syntax, TLD lookup and IDN tables.
//!    Nothing else can be checked until the name is known to parse under a real TLD.
//! 2. **Rules**: an ordered table of pure checks over the command, the TLD snapshot and the
//!    loaded resources. The first failing rule wins; later rules never run.
//!
//! Rules are plain functions so the order is visible in one place ([`RULES`]) and each group can
//! be tested on its own. Superuser overrides live inside the rules that allow them.

mod contacts;
mod eligibility;
mod extensions;
mod launch;
mod reserved;

use crate::commands::DomainCreateCommand;
use crate::config::FlowConfig;
use crate::cqrs::SessionMetadata;
use crate::domain::name::{parse_domain_name, validate_idn_label, DomainName, IdnTable, ACE_PREFIX};
use crate::domain::policy::{ReservationType, TldPhase, TldPolicySnapshot};
use crate::domain::registrar::Registrar;
use crate::domain::resources::{
    ContactResource, DomainApplication, DomainResource, HostResource, LaunchNotice,
};
use crate::domain::token::AllocationToken;
use crate::errors::{FlowError, FlowResult};
use crate::trademark::{SignedMarkData, TrademarkValidator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Resources the coordinator loaded for one create attempt
#[derive(Debug, Clone, Default)]
pub struct LoadedResources {
    /// Live domain with the same name, if any
    pub existing_domain: Option<DomainResource>,
    /// Pending application for the same name, if any
    pub open_application: Option<DomainApplication>,
    /// Referenced contacts that exist, by id
    pub contacts: HashMap<String, ContactResource>,
    /// Referenced hosts that exist, by name
    pub hosts: HashMap<String, HostResource>,
    /// Token named by the allocation-token extension
    pub extension_token: Option<AllocationToken>,
    /// Token whose string equals the command's auth code
    pub auth_code_token: Option<AllocationToken>,
}

/// Everything the pipeline reads
#[derive(Clone, Copy)]
pub struct CreateInput<'a> {
    /// The command
    pub command: &'a DomainCreateCommand,
    /// Session it arrived on
    pub session: &'a SessionMetadata,
    /// Registry-wide limits
    pub config: &'a FlowConfig,
    /// Transaction time
    pub now: DateTime<Utc>,
    /// Every configured TLD name
    pub tld_names: &'a [String],
    /// Policy for the TLD the name falls under; `None` when no TLD matched
    pub tld: Option<&'a TldPolicySnapshot>,
    /// Registrar of the session; `None` when unknown to the directory
    pub registrar: Option<&'a Registrar>,
    /// Linked and conflicting resources
    pub loaded: &'a LoadedResources,
    /// Trademark data
    pub trademark: &'a dyn TrademarkValidator,
}

impl<'a> CreateInput<'a> {
    fn is_superuser(&self) -> bool {
        self.session.is_superuser
    }
}

/// How anchor-tenant status was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorSource {
    /// Tool metadata flag
    Metadata,
    /// Allocation-token extension bound to the name
    AllocationToken,
    /// Auth code matching a token bound to the name
    AuthCode,
}

/// The name being created, resolved against its TLD
#[derive(Debug, Clone)]
pub struct Target<'a> {
    /// Parsed name
    pub name: DomainName,
    /// Policy of its TLD
    pub tld: &'a TldPolicySnapshot,
    /// IDN table the label matched, for `xn--` labels
    pub idn_table: Option<IdnTable>,
    /// Reservation types on the label across all lists
    pub reservation_types: BTreeSet<ReservationType>,
    /// Phase in force now
    pub phase: TldPhase,
    /// Requested years; the configured default when no period was sent
    pub years: u32,
    /// Anchor-tenant status, if any
    pub anchor: Option<AnchorSource>,
}

impl Target<'_> {
    /// `label.tld`
    pub fn fqdn(&self) -> String {
        self.name.fqdn()
    }

    /// Whether the label carries a reservation type
    pub fn is_reserved_as(&self, reservation: ReservationType) -> bool {
        self.reservation_types.contains(&reservation)
    }
}

/// Facts rules establish for later stages
#[derive(Debug, Clone, Default)]
pub struct Findings {
    /// Signed mark in use
    pub signed_mark: Option<SignedMarkData>,
    /// Claims notice to record
    pub launch_notice: Option<LaunchNotice>,
    /// Extension token to redeem at commit
    pub token_to_redeem: Option<String>,
}

/// A create that passed every rule
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCreate {
    /// Parsed name
    pub name: DomainName,
    /// Registration years
    pub years: u32,
    /// Phase in force
    pub phase: TldPhase,
    /// Anchor-tenant status
    pub anchor: Option<AnchorSource>,
    /// Name is on a name-collision list
    pub name_collision: bool,
    /// TLD restricts creates to nameserver-restricted names
    pub create_restricted: bool,
    /// Signed mark used
    pub signed_mark: Option<SignedMarkData>,
    /// Claims notice acknowledged
    pub launch_notice: Option<LaunchNotice>,
    /// Extension token to redeem
    pub token_to_redeem: Option<String>,
    /// IDN table of the label
    pub idn_table: Option<IdnTable>,
}

impl ValidatedCreate {
    /// `label.tld`
    pub fn fqdn(&self) -> String {
        self.name.fqdn()
    }

    /// Whether the create is an anchor-tenant create
    pub fn is_anchor_tenant(&self) -> bool {
        self.anchor.is_some()
    }
}

type Rule = fn(&CreateInput<'_>, &Target<'_>, &mut Findings) -> FlowResult<()>;

/// Rules in precedence order, after target resolution
pub const RULES: &[(&str, Rule)] = &[
    ("resource_existence", eligibility::check_not_taken),
    ("reserved_names", reserved::check_reservations),
    ("phase_gate", eligibility::check_phase),
    ("trademark", launch::check_marks_and_claims),
    ("allocation_token", eligibility::check_allocation_token),
    ("linked_resources", contacts::check_linked_resources),
    ("allow_lists", reserved::check_allow_lists),
    ("premium_names", eligibility::check_premium),
    ("registrar", eligibility::check_registrar),
    ("period", eligibility::check_period),
    ("dns_security", extensions::check_sec_dns),
    ("nameserver_count", extensions::check_nameserver_count),
    ("metadata", extensions::check_metadata_source),
    ("anchor_tenant_period", eligibility::check_anchor_period),
];

/// Run target resolution and every rule; return the first error.
pub fn validate_create(input: &CreateInput<'_>) -> FlowResult<ValidatedCreate> {
    let target = resolve_target(input)?;
    let mut findings = Findings::default();
    for (rule, check) in RULES {
        debug!(rule, domain = %target.name, "Checking create rule");
        check(input, &target, &mut findings)?;
    }
    Ok(ValidatedCreate {
        name_collision: target.is_reserved_as(ReservationType::NameCollision),
        create_restricted: target.tld.domain_create_restricted,
        name: target.name,
        years: target.years,
        phase: target.phase,
        anchor: target.anchor,
        signed_mark: findings.signed_mark,
        launch_notice: findings.launch_notice,
        token_to_redeem: findings.token_to_redeem,
        idn_table: target.idn_table,
    })
}

/// Extensions, syntax, TLD existence and IDN tables, in that order.
pub fn resolve_target<'a>(input: &CreateInput<'a>) -> FlowResult<Target<'a>> {
    extensions::check_declared(input)?;

    let name = parse_domain_name(input.command.name(), input.tld_names)?;
    let tld = input
        .tld
        .filter(|tld| tld.name == name.tld())
        .ok_or_else(|| FlowError::TldDoesNotExist {
            tld: name.tld().to_string(),
        })?;

    let unicode = validate_idn_label(name.label(), &tld.idn_tables)?;
    let idn_table = if name.label().starts_with(ACE_PREFIX) {
        tld.idn_tables
            .iter()
            .copied()
            .find(|table| table.accepts(&unicode))
    } else {
        None
    };

    let reservation_types = tld.reservation_types(name.label());
    let anchor = anchor_source(input, &name, &reservation_types);
    Ok(Target {
        phase: tld.phase_at(input.now),
        years: input
            .command
            .period
            .map_or(input.config.default_period_years, |period| period.value),
        name,
        tld,
        idn_table,
        reservation_types,
        anchor,
    })
}

fn anchor_source(
    input: &CreateInput<'_>,
    name: &DomainName,
    reservation_types: &BTreeSet<ReservationType>,
) -> Option<AnchorSource> {
    let metadata_anchor = input
        .command
        .extensions
        .metadata
        .as_ref()
        .is_some_and(|metadata| metadata.anchor_tenant);
    if metadata_anchor {
        return Some(AnchorSource::Metadata);
    }
    if !reservation_types.contains(&ReservationType::ReservedForAnchorTenant) {
        return None;
    }
    let fqdn = name.fqdn();
    let loaded = input.loaded;
    if loaded
        .extension_token
        .as_ref()
        .is_some_and(|token| token.is_bound_to(&fqdn) && !token.is_redeemed())
    {
        return Some(AnchorSource::AllocationToken);
    }
    if loaded
        .auth_code_token
        .as_ref()
        .is_some_and(|token| token.is_bound_to(&fqdn) && !token.is_redeemed())
    {
        return Some(AnchorSource::AuthCode);
    }
    None
}

/// An unredeemed token from either source bound to exactly this name
fn has_bound_token(input: &CreateInput<'_>, fqdn: &str) -> bool {
    let loaded = input.loaded;
    loaded
        .extension_token
        .iter()
        .chain(loaded.auth_code_token.iter())
        .any(|token| token.is_bound_to(fqdn) && !token.is_redeemed())
}


#[cfg(test)]
mod tests {
    use super::fixtures::Scenario;
    use super::*;
    use crate::domain::policy::ReservedList;
    use crate::domain::value_objects::Period;

    #[test]
    fn test_plain_create_passes() {
        let validated = Scenario::new("example.tld").validate().unwrap();
        assert_eq!(validated.fqdn(), "example.tld");
        assert_eq!(validated.years, 1);
        assert_eq!(validated.phase, TldPhase::GeneralAvailability);
        assert!(!validated.is_anchor_tenant());
        assert!(!validated.name_collision);
        assert!(validated.token_to_redeem.is_none());
        assert!(validated.idn_table.is_none());
    }

    #[test]
    fn test_period_and_multipart_tld() {
        let mut scenario = Scenario::new("example.foo.tld");
        scenario.tld = Some(TldPolicySnapshot::new("foo.tld"));
        scenario.registrar = Some(Registrar::active("TheRegistrar", ["foo.tld"]));
        scenario.command.period = Some(Period::years(2));
        let validated = scenario.validate().unwrap();
        assert_eq!(validated.name.tld(), "foo.tld");
        assert_eq!(validated.years, 2);
    }

    #[test]
    fn test_idn_label_records_table() {
        let validated = Scenario::new("xn--mnchen-3ya.tld").validate().unwrap();
        assert_eq!(validated.idn_table, Some(IdnTable::ExtendedLatin));
    }

    #[test]
    fn test_idn_label_outside_tables() {
        assert_eq!(
            Scenario::new("xn--e1afmkfd.tld").error(),
            FlowError::InvalidIdnDomainLabel
        );
    }

    #[test]
    fn test_policy_must_match_parsed_tld() {
        let mut scenario = Scenario::new("example.tld");
        scenario.tld = None;
        assert_eq!(
            scenario.error(),
            FlowError::TldDoesNotExist { tld: "tld".into() }
        );
    }

    #[test]
    fn test_syntax_checked_before_tld_policy() {
        let mut scenario = Scenario::new("-example.tld");
        scenario.tld = None;
        assert_eq!(scenario.error(), FlowError::LeadingDash);
    }

    #[test]
    fn test_anchor_from_auth_code_token() {
        let mut scenario = Scenario::new("anchor.tld");
        scenario.update_tld(|tld| {
            tld.with_reserved_lists(vec![ReservedList::parse(
                "tld-reserved",
                ["anchor,RESERVED_FOR_ANCHOR_TENANT"],
            )
            .unwrap()])
        });
        scenario.command.period = Some(Period::years(2));
        scenario.loaded.auth_code_token =
            Some(AllocationToken::new("2fooBAR").bound_to("anchor.tld"));
        let validated = scenario.validate().unwrap();
        assert_eq!(validated.anchor, Some(AnchorSource::AuthCode));
        assert!(validated.token_to_redeem.is_none());
    }

    #[test]
    fn test_rule_table_order_is_stable() {
        let names: Vec<&str> = RULES.iter().map(|(name, _)| *name).collect();
        assert_eq!(names.first(), Some(&"resource_existence"));
        assert_eq!(names.last(), Some(&"anchor_tenant_period"));
        assert_eq!(names.len(), 14);
    }

}
