// Copyright 2025 Cowboy AI, LLC.

//! Shared setup for the create flow integration tests.
//!
//! The harness seeds a GA `tld` at USD 13 per year, registrar `TheRegistrar`, contacts
//! `jd1234`/`sh8013` and hosts `ns1`/`ns2.example.net`, and pins the clock to
//! 2014-09-09T09:09:09Z.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use registry_flows::commands::{
    DeclaredFee, FeeCreateExtension, FeeExtensionVersion, ALLOCATION_TOKEN_EXTENSION_URI,
    LAUNCH_EXTENSION_URI, SEC_DNS_EXTENSION_URI,
};
use registry_flows::domain::{
    ContactResource, ContactRole, DomainContact, HostResource, Registrar, TldPolicySnapshot,
};
use registry_flows::{
    CommandEnvelope, CommandHandler, CreateResponse, DomainCreateCommand, DomainCreateCustomLogic,
    DomainCreateFlow, FixedClock, FlowConfig, FlowResult, InMemoryMetricSink,
    InMemoryRegistryStore, InMemoryTrademarkValidator, NoCustomLogic, SessionMetadata, Trid,
};
use rust_decimal::Decimal;
use std::sync::Arc;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2014, 9, 9, 9, 9, 9).unwrap()
}

pub fn declared_uris() -> Vec<String> {
    let mut uris: Vec<String> = [
        FeeExtensionVersion::V06,
        FeeExtensionVersion::V11,
        FeeExtensionVersion::V12,
    ]
    .iter()
    .map(|version| version.uri().to_string())
    .collect();
    uris.extend(
        [
            LAUNCH_EXTENSION_URI,
            SEC_DNS_EXTENSION_URI,
            ALLOCATION_TOKEN_EXTENSION_URI,
        ]
        .map(str::to_string),
    );
    uris
}

/// A create with the standard contacts and hosts
pub fn command(name: &str) -> DomainCreateCommand {
    let mut command = DomainCreateCommand::new(name, "2fooBAR");
    command.registrant = Some("jd1234".into());
    command.contacts = vec![
        DomainContact::new(ContactRole::Admin, "sh8013"),
        DomainContact::new(ContactRole::Tech, "sh8013"),
    ];
    command.nameservers = vec!["ns1.example.net".into(), "ns2.example.net".into()];
    command
}

pub fn fee_extension(lines: &[(&str, Decimal)]) -> FeeCreateExtension {
    FeeCreateExtension::new(
        FeeExtensionVersion::V06,
        Some("USD"),
        lines
            .iter()
            .map(|(description, amount)| DeclaredFee::new(*description, *amount))
            .collect(),
    )
}

pub fn session() -> SessionMetadata {
    SessionMetadata::epp("TheRegistrar", declared_uris())
}

pub fn envelope(command: DomainCreateCommand) -> CommandEnvelope<DomainCreateCommand> {
    envelope_with(command, session())
}

pub fn envelope_with(
    command: DomainCreateCommand,
    session: SessionMetadata,
) -> CommandEnvelope<DomainCreateCommand> {
    CommandEnvelope::new(command, session, Trid::new(Some("ABC-12345"), "server-trid"))
}

pub struct Harness {
    pub store: InMemoryRegistryStore,
    pub metrics: InMemoryMetricSink,
    pub trademark: InMemoryTrademarkValidator,
    pub config: FlowConfig,
    pub custom_logic: Arc<dyn DomainCreateCustomLogic>,
    pub now: DateTime<Utc>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_tld(TldPolicySnapshot::new("tld")).await
    }

    pub async fn with_tld(tld: TldPolicySnapshot) -> Self {
        let store = InMemoryRegistryStore::new();
        let tld_name = tld.name.clone();
        store.put_tld(tld).await;
        store
            .put_registrar(Registrar::active("TheRegistrar", [tld_name]))
            .await;
        for id in ["jd1234", "sh8013"] {
            store.put_contact(ContactResource::active(id)).await;
        }
        for host in ["ns1.example.net", "ns2.example.net"] {
            store.put_host(HostResource::active(host)).await;
        }
        Self {
            store,
            metrics: InMemoryMetricSink::new(),
            trademark: InMemoryTrademarkValidator::new(),
            config: FlowConfig::default(),
            custom_logic: Arc::new(NoCustomLogic),
            now: now(),
        }
    }

    pub fn flow(&self) -> DomainCreateFlow {
        DomainCreateFlow::new(
            Arc::new(self.store.clone()),
            Arc::new(self.trademark.clone()),
        )
        .with_clock(Arc::new(FixedClock(self.now)))
        .with_config(self.config.clone())
        .with_metrics(Arc::new(self.metrics.clone()))
        .with_custom_logic(self.custom_logic.clone())
    }

    pub async fn run(&self, envelope: CommandEnvelope<DomainCreateCommand>) -> FlowResult<CreateResponse> {
        self.flow().handle(envelope).await
    }

    pub async fn create(&self, command: DomainCreateCommand) -> FlowResult<CreateResponse> {
        self.run(envelope(command)).await
    }
}
