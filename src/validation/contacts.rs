// Copyright 2025 Cowboy AI, LLC.

//! Linked contacts and hosts.

use super::{CreateInput, Findings, Target};
use crate::domain::resources::{ContactRole, StatusValue};
use crate::errors::{FlowError, FlowResult};
use std::collections::{BTreeSet, HashSet};

/// Contact types, existence, pending delete, duplicate roles, then the required roles.
pub(super) fn check_linked_resources(
    input: &CreateInput<'_>,
    _target: &Target<'_>,
    _findings: &mut Findings,
) -> FlowResult<()> {
    let command = input.command;
    let loaded = input.loaded;
    if command.contacts.iter().any(|contact| contact.role.is_none()) {
        return Err(FlowError::MissingContactType);
    }

    let contact_ids: BTreeSet<&str> = command
        .registrant
        .iter()
        .map(String::as_str)
        .chain(command.contacts.iter().map(|c| c.contact_id.as_str()))
        .collect();
    let missing: Vec<String> = contact_ids
        .iter()
        .filter(|id| !loaded.contacts.contains_key(**id))
        .map(|id| id.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(FlowError::LinkedResourcesDoNotExist {
            kind: "contact",
            ids: missing,
        });
    }
    let host_names: BTreeSet<&str> = command.nameservers.iter().map(String::as_str).collect();
    let missing: Vec<String> = host_names
        .iter()
        .filter(|host| !loaded.hosts.contains_key(**host))
        .map(|host| host.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(FlowError::LinkedResourcesDoNotExist {
            kind: "host",
            ids: missing,
        });
    }

    let pending: Vec<String> = contact_ids
        .iter()
        .filter_map(|id| loaded.contacts.get(*id))
        .filter(|contact| contact.statuses.contains(&StatusValue::PendingDelete))
        .map(|contact| contact.contact_id.clone())
        .chain(
            host_names
                .iter()
                .filter_map(|host| loaded.hosts.get(*host))
                .filter(|host| host.statuses.contains(&StatusValue::PendingDelete))
                .map(|host| host.host_name.clone()),
        )
        .collect();
    if !pending.is_empty() {
        return Err(FlowError::LinkedResourceInPendingDeleteProhibitsOperation { ids: pending });
    }

    let mut seen_roles = HashSet::new();
    for role in command.contacts.iter().filter_map(|contact| contact.role) {
        if !seen_roles.insert(role) {
            return Err(FlowError::DuplicateContactForRole);
        }
    }
    if command.registrant.is_none() {
        return Err(FlowError::MissingRegistrant);
    }
    if !seen_roles.contains(&ContactRole::Admin) {
        return Err(FlowError::MissingAdminContact);
    }
    if !seen_roles.contains(&ContactRole::Tech) {
        return Err(FlowError::MissingTechnicalContact);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::Scenario;
    use super::*;
    use crate::domain::resources::{ContactResource, DomainContact, HostResource};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_contact_type() {
        let mut scenario = Scenario::new("example.tld");
        scenario.command.contacts.push(DomainContact {
            role: None,
            contact_id: "sh8013".into(),
        });
        assert_eq!(scenario.error(), FlowError::MissingContactType);
    }

    #[test]
    fn test_missing_linked_contact_and_host() {
        let mut scenario = Scenario::new("example.tld");
        scenario.loaded.contacts.remove("sh8013");
        scenario.loaded.hosts.remove("ns2.example.net");
        assert_eq!(
            scenario.error(),
            FlowError::LinkedResourcesDoNotExist {
                kind: "contact",
                ids: vec!["sh8013".into()]
            }
        );

        scenario
            .loaded
            .contacts
            .insert("sh8013".into(), ContactResource::active("sh8013"));
        assert_eq!(
            scenario.error(),
            FlowError::LinkedResourcesDoNotExist {
                kind: "host",
                ids: vec!["ns2.example.net".into()]
            }
        );
    }

    #[test]
    fn test_pending_delete_links() {
        let mut scenario = Scenario::new("example.tld");
        scenario.loaded.hosts.insert(
            "ns1.example.net".into(),
            HostResource::active("ns1.example.net").pending_delete(),
        );
        scenario.loaded.contacts.insert(
            "jd1234".into(),
            ContactResource::active("jd1234").pending_delete(),
        );
        assert_eq!(
            scenario.error(),
            FlowError::LinkedResourceInPendingDeleteProhibitsOperation {
                ids: vec!["jd1234".into(), "ns1.example.net".into()]
            }
        );
    }

    #[test]
    fn test_duplicate_role() {
        let mut scenario = Scenario::new("example.tld");
        scenario
            .command
            .contacts
            .push(DomainContact::new(ContactRole::Tech, "jd1234"));
        assert_eq!(scenario.error(), FlowError::DuplicateContactForRole);
    }

    #[test]
    fn test_required_roles() {
        let mut scenario = Scenario::new("example.tld");
        scenario.command.registrant = None;
        assert_eq!(scenario.error(), FlowError::MissingRegistrant);

        scenario.command.registrant = Some("jd1234".into());
        scenario.command.contacts = vec![DomainContact::new(ContactRole::Tech, "sh8013")];
        assert_eq!(scenario.error(), FlowError::MissingAdminContact);

        scenario.command.contacts = vec![DomainContact::new(ContactRole::Admin, "sh8013")];
        assert_eq!(scenario.error(), FlowError::MissingTechnicalContact);
    }

    #[test]
    fn test_billing_contact_is_optional_but_allowed() {
        let mut scenario = Scenario::new("example.tld");
        scenario
            .command
            .contacts
            .push(DomainContact::new(ContactRole::Billing, "jd1234"));
        assert!(scenario.validate().is_ok());
    }
}
