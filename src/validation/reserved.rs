// Copyright 2025 Cowboy AI, LLC.

//! Reserved names, create restrictions and allow-lists.
//!
//! A blocking reservation (fully blocked, specific use, anchor tenant) stops a create unless the
//! caller is a superuser, a token is bound to exactly this name, the create is an anchor-tenant
//! create, or the name is nameserver-restricted. Allow-lists apply to every caller.

use super::{has_bound_token, CreateInput, Findings, Target};
use crate::domain::policy::ReservationType;
use crate::errors::{FlowError, FlowResult};
use std::collections::BTreeSet;

pub(super) fn check_reservations(
    input: &CreateInput<'_>,
    target: &Target<'_>,
    _findings: &mut Findings,
) -> FlowResult<()> {
    if input.is_superuser() {
        return Ok(());
    }
    let fqdn = target.fqdn();
    let nameserver_restricted = target.is_reserved_as(ReservationType::NameserverRestricted);
    let blocked = target
        .reservation_types
        .iter()
        .any(ReservationType::is_blocking);
    let overridden =
        nameserver_restricted || target.anchor.is_some() || has_bound_token(input, &fqdn);
    if blocked && !overridden {
        return Err(FlowError::DomainReserved { name: fqdn });
    }
    if target.tld.domain_create_restricted && !nameserver_restricted {
        return Err(FlowError::DomainNotAllowedForTldWithCreateRestriction { name: fqdn });
    }
    Ok(())
}

pub(super) fn check_allow_lists(
    input: &CreateInput<'_>,
    target: &Target<'_>,
    _findings: &mut Findings,
) -> FlowResult<()> {
    let tld = target.tld;
    if let Some(registrant) = &input.command.registrant {
        if !tld.allowed_registrant_contact_ids.is_empty()
            && !tld.allowed_registrant_contact_ids.contains(registrant)
        {
            return Err(FlowError::RegistrantNotAllowed {
                contact: registrant.clone(),
            });
        }
    }

    let nameservers = &input.command.nameservers;
    let nameserver_restricted = target.is_reserved_as(ReservationType::NameserverRestricted);
    if nameservers.is_empty() {
        if !tld.allowed_fully_qualified_host_names.is_empty() {
            return Err(
                FlowError::NameserversNotSpecifiedForTldWithNameserverWhitelist {
                    name: target.fqdn(),
                },
            );
        }
        if nameserver_restricted {
            return Err(
                FlowError::NameserversNotSpecifiedForNameserverRestrictedDomain {
                    name: target.fqdn(),
                },
            );
        }
        return Ok(());
    }

    if !tld.allowed_fully_qualified_host_names.is_empty() {
        let disallowed = outside(nameservers, &tld.allowed_fully_qualified_host_names);
        if !disallowed.is_empty() {
            return Err(FlowError::NameserversNotAllowedForTld { hosts: disallowed });
        }
    }
    if let Some(allowed) = tld.allowed_nameservers_for(target.name.label()) {
        let disallowed = outside(nameservers, &allowed);
        if !disallowed.is_empty() {
            return Err(FlowError::NameserversNotAllowedForDomain { hosts: disallowed });
        }
    }
    Ok(())
}

fn outside(hosts: &[String], allowed: &BTreeSet<String>) -> Vec<String> {
    hosts
        .iter()
        .filter(|host| !allowed.contains(*host))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::Scenario;
    use super::*;
    use crate::domain::policy::ReservedList;
    use crate::domain::resources::HostResource;
    use crate::domain::policy::TldPhase;
    use crate::domain::token::AllocationToken;
    use crate::entity::HistoryEntryId;
    use test_case::test_case;

    fn redeemed_auth_code(fqdn: &str) -> AllocationToken {
        let mut token = AllocationToken::new("abc123").bound_to(fqdn);
        token.redeem(HistoryEntryId::new()).unwrap();
        token
    }

    fn with_list(scenario: &mut Scenario, lines: &[&str]) {
        let list = ReservedList::parse("tld-reserved", lines.iter().copied()).unwrap();
        scenario.update_tld(|tld| tld.with_reserved_lists(vec![list]));
    }

    fn with_host(scenario: &mut Scenario, host: &str) {
        scenario
            .loaded
            .hosts
            .insert(host.into(), HostResource::active(host));
    }

    #[test_case("reserved,FULLY_BLOCKED" ; "fully blocked")]
    #[test_case("reserved,RESERVED_FOR_SPECIFIC_USE" ; "specific use")]
    #[test_case("reserved,RESERVED_FOR_ANCHOR_TENANT" ; "anchor tenant")]
    fn test_blocking_reservations(line: &str) {
        let mut scenario = Scenario::new("reserved.tld");
        with_list(&mut scenario, &[line]);
        assert_eq!(
            scenario.error(),
            FlowError::DomainReserved {
                name: "reserved.tld".into()
            }
        );

        scenario.session = scenario.session.clone().superuser();
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_name_collision_is_not_blocking() {
        let mut scenario = Scenario::new("collision.tld");
        with_list(&mut scenario, &["collision,NAME_COLLISION"]);
        assert!(scenario.validate().unwrap().name_collision);
    }

    #[test]
    fn test_bound_token_unlocks_specific_use() {
        let mut scenario = Scenario::new("resdom.tld");
        with_list(&mut scenario, &["resdom,RESERVED_FOR_SPECIFIC_USE"]);
        scenario.command.extensions.allocation_token = Some("abc123".into());
        scenario.loaded.extension_token =
            Some(AllocationToken::new("abc123").bound_to("resdom.tld"));
        let validated = scenario.validate().unwrap();
        assert_eq!(validated.token_to_redeem.as_deref(), Some("abc123"));
    }

    #[test_case("reserved,FULLY_BLOCKED" ; "fully blocked")]
    #[test_case("reserved,RESERVED_FOR_SPECIFIC_USE" ; "specific use")]
    #[test_case("reserved,RESERVED_FOR_ANCHOR_TENANT" ; "anchor tenant")]
    fn test_redeemed_auth_code_does_not_unlock(line: &str) {
        let mut scenario = Scenario::new("reserved.tld");
        with_list(&mut scenario, &[line]);
        scenario.command.auth_info = "abc123".into();
        scenario.loaded.auth_code_token = Some(redeemed_auth_code("reserved.tld"));
        assert_eq!(
            scenario.error(),
            FlowError::DomainReserved {
                name: "reserved.tld".into()
            }
        );
    }

    #[test]
    fn test_redeemed_auth_code_does_not_open_phase_gate() {
        let mut scenario = Scenario::new("resdom.tld");
        scenario.update_tld(|tld| tld.with_phase(TldPhase::Landrush));
        with_list(&mut scenario, &["resdom,RESERVED_FOR_SPECIFIC_USE"]);
        scenario.command.auth_info = "abc123".into();
        scenario.loaded.auth_code_token = Some(redeemed_auth_code("resdom.tld"));
        assert_eq!(
            scenario.error(),
            FlowError::DomainReserved {
                name: "resdom.tld".into()
            }
        );

        scenario.loaded.auth_code_token =
            Some(AllocationToken::new("abc123").bound_to("resdom.tld"));
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_token_for_other_name_does_not_unlock() {
        let mut scenario = Scenario::new("resdom.tld");
        with_list(&mut scenario, &["resdom,RESERVED_FOR_SPECIFIC_USE"]);
        scenario.command.extensions.allocation_token = Some("abc123".into());
        scenario.loaded.extension_token =
            Some(AllocationToken::new("abc123").bound_to("other.tld"));
        assert_eq!(
            scenario.error(),
            FlowError::DomainReserved {
                name: "resdom.tld".into()
            }
        );
    }

    #[test]
    fn test_create_restricted_tld() {
        let mut scenario = Scenario::new("example.tld");
        scenario.update_tld(|tld| tld.with_domain_create_restricted(true));
        assert_eq!(
            scenario.error(),
            FlowError::DomainNotAllowedForTldWithCreateRestriction {
                name: "example.tld".into()
            }
        );

        with_list(
            &mut scenario,
            &["example,NAMESERVER_RESTRICTED,ns1.example.net:ns2.example.net"],
        );
        let validated = scenario.validate().unwrap();
        assert!(validated.create_restricted);
    }

    #[test]
    fn test_registrant_allow_list() {
        let mut scenario = Scenario::new("example.tld");
        scenario.update_tld(|tld| tld.with_allowed_registrants(["someone".to_string()]));
        assert_eq!(
            scenario.error(),
            FlowError::RegistrantNotAllowed {
                contact: "jd1234".into()
            }
        );
    }

    #[test]
    fn test_tld_nameserver_allow_list_names_offenders() {
        let mut scenario = Scenario::new("example.tld");
        scenario.update_tld(|tld| {
            tld.with_allowed_nameservers(["ns1.example.net".to_string()])
        });
        assert_eq!(
            scenario.error(),
            FlowError::NameserversNotAllowedForTld {
                hosts: vec!["ns2.example.net".into()]
            }
        );
        assert!(scenario.error().to_string().contains("ns2.example.net"));
    }

    #[test]
    fn test_missing_nameservers() {
        let mut scenario = Scenario::new("example.tld");
        scenario.command.nameservers.clear();
        assert!(scenario.validate().is_ok());

        with_list(
            &mut scenario,
            &["example,NAMESERVER_RESTRICTED,ns1.example.net"],
        );
        assert_eq!(
            scenario.error(),
            FlowError::NameserversNotSpecifiedForNameserverRestrictedDomain {
                name: "example.tld".into()
            }
        );

        scenario.update_tld(|tld| {
            tld.with_allowed_nameservers(["ns1.example.net".to_string()])
        });
        assert_eq!(
            scenario.error(),
            FlowError::NameserversNotSpecifiedForTldWithNameserverWhitelist {
                name: "example.tld".into()
            }
        );
    }

    #[test]
    fn test_domain_nameserver_list_is_intersection_of_lists() {
        let mut scenario = Scenario::new("example.tld");
        for host in ["ns3.example.net", "ns4.example.net"] {
            with_host(&mut scenario, host);
        }
        let tld_list = ReservedList::parse(
            "tld-reserved",
            ["example,NAMESERVER_RESTRICTED,ns1.example.net:ns2.example.net:ns3.example.net"],
        )
        .unwrap();
        let global = ReservedList::parse(
            "global",
            ["example,NAMESERVER_RESTRICTED,ns2.example.net:ns3.example.net:ns4.example.net"],
        )
        .unwrap();
        scenario.update_tld(|tld| tld.with_reserved_lists(vec![tld_list, global]));

        scenario.command.nameservers = vec!["ns2.example.net".into(), "ns3.example.net".into()];
        assert!(scenario.validate().is_ok());

        scenario.command.nameservers = vec!["ns1.example.net".into(), "ns2.example.net".into()];
        assert_eq!(
            scenario.error(),
            FlowError::NameserversNotAllowedForDomain {
                hosts: vec!["ns1.example.net".into()]
            }
        );
    }

    #[test]
    fn test_both_lists_report_tld_side_first() {
        let mut scenario = Scenario::new("example.tld");
        with_host(&mut scenario, "ns3.example.net");
        with_list(
            &mut scenario,
            &["example,NAMESERVER_RESTRICTED,ns1.example.net"],
        );
        scenario.update_tld(|tld| {
            tld.with_allowed_nameservers([
                "ns1.example.net".to_string(),
                "ns2.example.net".to_string(),
            ])
        });
        scenario.command.nameservers = vec!["ns2.example.net".into(), "ns3.example.net".into()];
        assert_eq!(
            scenario.error(),
            FlowError::NameserversNotAllowedForTld {
                hosts: vec!["ns3.example.net".into()]
            }
        );

        scenario.command.nameservers = vec!["ns2.example.net".into()];
        assert_eq!(
            scenario.error(),
            FlowError::NameserversNotAllowedForDomain {
                hosts: vec!["ns2.example.net".into()]
            }
        );
    }

    #[test]
    fn test_superuser_still_bound_by_allow_lists() {
        let mut scenario = Scenario::new("example.tld");
        scenario.session = scenario.session.clone().superuser();
        scenario.update_tld(|tld| {
            tld.with_allowed_nameservers(["ns1.example.net".to_string()])
        });
        assert!(matches!(
            scenario.error(),
            FlowError::NameserversNotAllowedForTld { .. }
        ));
    }
}
