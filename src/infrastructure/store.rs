// Copyright 2025 Cowboy AI, LLC.

//! Registry storage contract and a transactional in-memory store
//!
//! Reads are plain lookups. The only write is [`RegistryStore::commit_create`], which applies a
//! whole create atomically: either every entity, the token redemption and the tasks land, or
//! nothing does. Two invariants are re-checked under the write lock:
//!
//! - no live domain holds the name
//! - the redeemed token is still unredeemed
//!
//! A violation is reported as [`StoreError::ConcurrencyConflict`]; the coordinator reruns the
//! create against fresh reads, where the same condition surfaces as a regular flow error.

use crate::domain::billing::BillingEvent;
use crate::domain::history::HistoryEntry;
use crate::domain::policy::TldPolicySnapshot;
use crate::domain::poll::PollMessage;
use crate::domain::registrar::Registrar;
use crate::domain::resources::{ContactResource, DomainApplication, DomainResource, HostResource};
use crate::domain::token::AllocationToken;
use crate::factory::MaterializedCreate;
use crate::tasks::QueuedTask;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Store errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A concurrent transaction changed data this one depends on
    #[error("Concurrent modification of {key}")]
    ConcurrencyConflict {
        /// Contended key
        key: String,
    },

    /// Backend failure
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Everything a create writes in one transaction
#[derive(Debug, Clone)]
pub struct CreateMutation {
    /// Entities
    pub created: MaterializedCreate,
    /// Extension token to mark redeemed by the new history entry
    pub token_to_redeem: Option<String>,
    /// Tasks enqueued on commit
    pub tasks: Vec<QueuedTask>,
}

/// Reads and the atomic create commit
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Every configured TLD
    async fn tld_names(&self) -> Result<Vec<String>, StoreError>;

    /// Policy snapshot of a TLD
    async fn load_tld(&self, tld: &str) -> Result<Option<TldPolicySnapshot>, StoreError>;

    /// Registrar by client id
    async fn load_registrar(&self, client_id: &str) -> Result<Option<Registrar>, StoreError>;

    /// Domain with this name that is live at `now`
    async fn load_active_domain(
        &self,
        fqdn: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<DomainResource>, StoreError>;

    /// Non-rejected application for this name
    async fn load_open_application(
        &self,
        fqdn: &str,
    ) -> Result<Option<DomainApplication>, StoreError>;

    /// Contacts that exist among `ids`
    async fn load_contacts(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, ContactResource>, StoreError>;

    /// Hosts that exist among `names`
    async fn load_hosts(&self, names: &[String]) -> Result<HashMap<String, HostResource>, StoreError>;

    /// Allocation token by string
    async fn load_token(&self, token: &str) -> Result<Option<AllocationToken>, StoreError>;

    /// Apply a create atomically
    async fn commit_create(
        &self,
        mutation: CreateMutation,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct RegistryState {
    tlds: HashMap<String, TldPolicySnapshot>,
    registrars: HashMap<String, Registrar>,
    domains: HashMap<String, Vec<DomainResource>>,
    applications: HashMap<String, DomainApplication>,
    contacts: HashMap<String, ContactResource>,
    hosts: HashMap<String, HostResource>,
    tokens: HashMap<String, AllocationToken>,
    history: Vec<HistoryEntry>,
    billing_events: Vec<BillingEvent>,
    poll_messages: Vec<PollMessage>,
    tasks: Vec<QueuedTask>,
}

impl RegistryState {
    fn active_domain(&self, fqdn: &str, now: DateTime<Utc>) -> Option<&DomainResource> {
        self.domains
            .get(fqdn)
            .and_then(|versions| versions.iter().find(|domain| domain.is_active_at(now)))
    }
}

/// In-memory store; clones share state
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistryStore {
    state: Arc<RwLock<RegistryState>>,
    injected_conflicts: Arc<AtomicU32>,
}

impl InMemoryRegistryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a TLD
    pub async fn put_tld(&self, tld: TldPolicySnapshot) {
        self.state.write().await.tlds.insert(tld.name.clone(), tld);
    }

    /// Add or replace a registrar
    pub async fn put_registrar(&self, registrar: Registrar) {
        self.state
            .write()
            .await
            .registrars
            .insert(registrar.client_id.clone(), registrar);
    }

    /// Add a domain version
    pub async fn put_domain(&self, domain: DomainResource) {
        self.state
            .write()
            .await
            .domains
            .entry(domain.fully_qualified_domain_name.clone())
            .or_default()
            .push(domain);
    }

    /// Add or replace an application
    pub async fn put_application(&self, application: DomainApplication) {
        self.state
            .write()
            .await
            .applications
            .insert(application.domain_name.clone(), application);
    }

    /// Add or replace a contact
    pub async fn put_contact(&self, contact: ContactResource) {
        self.state
            .write()
            .await
            .contacts
            .insert(contact.contact_id.clone(), contact);
    }

    /// Add or replace a host
    pub async fn put_host(&self, host: HostResource) {
        self.state
            .write()
            .await
            .hosts
            .insert(host.host_name.clone(), host);
    }

    /// Add or replace a token
    pub async fn put_token(&self, token: AllocationToken) {
        self.state
            .write()
            .await
            .tokens
            .insert(token.token.clone(), token);
    }

    /// Make the next `count` commits fail with a conflict
    pub fn inject_conflicts(&self, count: u32) {
        self.injected_conflicts.store(count, Ordering::SeqCst);
    }

    /// Every version of a domain, oldest first
    pub async fn domain_versions(&self, fqdn: &str) -> Vec<DomainResource> {
        self.state
            .read()
            .await
            .domains
            .get(fqdn)
            .cloned()
            .unwrap_or_default()
    }

    /// Token as stored
    pub async fn token(&self, token: &str) -> Option<AllocationToken> {
        self.state.read().await.tokens.get(token).cloned()
    }

    /// Committed history entries
    pub async fn history_entries(&self) -> Vec<HistoryEntry> {
        self.state.read().await.history.clone()
    }

    /// Committed billing events
    pub async fn billing_events(&self) -> Vec<BillingEvent> {
        self.state.read().await.billing_events.clone()
    }

    /// Committed poll messages
    pub async fn poll_messages(&self) -> Vec<PollMessage> {
        self.state.read().await.poll_messages.clone()
    }

    /// Enqueued tasks
    pub async fn tasks(&self) -> Vec<QueuedTask> {
        self.state.read().await.tasks.clone()
    }

    fn take_injected_conflict(&self) -> bool {
        self.injected_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                left.checked_sub(1)
            })
            .is_ok()
    }
}

#[async_trait]
impl RegistryStore for InMemoryRegistryStore {
    async fn tld_names(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self.state.read().await.tlds.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn load_tld(&self, tld: &str) -> Result<Option<TldPolicySnapshot>, StoreError> {
        Ok(self.state.read().await.tlds.get(tld).cloned())
    }

    async fn load_registrar(&self, client_id: &str) -> Result<Option<Registrar>, StoreError> {
        Ok(self.state.read().await.registrars.get(client_id).cloned())
    }

    async fn load_active_domain(
        &self,
        fqdn: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<DomainResource>, StoreError> {
        Ok(self.state.read().await.active_domain(fqdn, now).cloned())
    }

    async fn load_open_application(
        &self,
        fqdn: &str,
    ) -> Result<Option<DomainApplication>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .applications
            .get(fqdn)
            .filter(|application| !application.rejected)
            .cloned())
    }

    async fn load_contacts(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, ContactResource>, StoreError> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.contacts.get(id).map(|c| (id.clone(), c.clone())))
            .collect())
    }

    async fn load_hosts(&self, names: &[String]) -> Result<HashMap<String, HostResource>, StoreError> {
        let state = self.state.read().await;
        Ok(names
            .iter()
            .filter_map(|name| state.hosts.get(name).map(|h| (name.clone(), h.clone())))
            .collect())
    }

    async fn load_token(&self, token: &str) -> Result<Option<AllocationToken>, StoreError> {
        Ok(self.state.read().await.tokens.get(token).cloned())
    }

    async fn commit_create(
        &self,
        mutation: CreateMutation,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let CreateMutation {
            created,
            token_to_redeem,
            tasks,
        } = mutation;
        let fqdn = created.domain.fully_qualified_domain_name.clone();

        let mut state = self.state.write().await;
        if self.take_injected_conflict() {
            debug!(domain = %fqdn, "Injected commit conflict");
            return Err(StoreError::ConcurrencyConflict { key: fqdn });
        }
        if state.active_domain(&fqdn, now).is_some() {
            debug!(domain = %fqdn, "Name taken by a concurrent create");
            return Err(StoreError::ConcurrencyConflict { key: fqdn });
        }
        if let Some(token) = &token_to_redeem {
            let stored = state
                .tokens
                .get_mut(token)
                .ok_or_else(|| StoreError::ConcurrencyConflict { key: token.clone() })?;
            if stored.redeem(created.history.id).is_err() {
                debug!(token = %token, "Token redeemed by a concurrent create");
                return Err(StoreError::ConcurrencyConflict { key: token.clone() });
            }
        }

        let MaterializedCreate {
            domain,
            history,
            billing_events,
            poll_messages,
        } = created;
        state.domains.entry(fqdn.clone()).or_default().push(domain);
        state.history.push(history);
        state.billing_events.extend(billing_events);
        state.poll_messages.extend(poll_messages);
        state.tasks.extend(tasks);
        debug!(domain = %fqdn, "Committed create");
        Ok(())
    }
}
