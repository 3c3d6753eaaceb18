// Copyright 2025 Cowboy AI, LLC.

//! # Registry Flows
//!
//! Command flows for a domain-name registry, starting with the EPP domain create.
//!
//! A create runs as a small state machine over immutable inputs:
//! - **Validation**: an ordered, fail-fast rule pipeline over the command, the TLD policy
//!   snapshot and the linked resources it references
//! - **Pricing**: standard or premium cost plus the early-access fee in force, reconciled
//!   against the fees the client declared
//! - **Materialisation**: the domain, its history entry, billing events, grace period and
//!   poll messages, built in memory
//! - **Commit**: one atomic write through the [`RegistryStore`](infrastructure::RegistryStore),
//!   including allocation-token redemption and the DNS/LORDN tasks
//!
//! ## Design Principles
//!
//! 1. **Closed errors**: every rejection is a [`FlowError`] variant carrying its context
//! 2. **Snapshots, not builders**: policy is read once per attempt and never mutated
//! 3. **Single write point**: only `Materialized → Committed` touches the store
//! 4. **Retry on contention**: a conflicting commit reruns the whole attempt on fresh reads

#![warn(missing_docs)]

pub mod clock;
pub mod commands;
pub mod config;
pub mod cqrs;
pub mod domain;
pub mod entity;
pub mod errors;
pub mod factory;
pub mod fees;
pub mod flows;
pub mod infrastructure;
pub mod pricing;
pub mod state_machine;
pub mod tasks;
pub mod trademark;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use commands::{
    ClaimsNotice, CreateExtensions, DeclaredFee, DomainCreateCommand, FeeCreateExtension,
    FeeExtensionVersion, LaunchCreateExtension, LaunchPhase, MetadataExtension,
    SecDnsCreateExtension,
};
pub use config::{ConfigError, FlowConfig};
pub use cqrs::{
    Command, CommandEnvelope, CommandHandler, RequestSource, SessionMetadata, Trid,
};
pub use entity::{
    BillingEventId, CommandId, EntityId, HistoryEntryId, PollMessageId, RepoId, TaskId,
};
pub use errors::{ErrorCategory, FlowError, FlowResult};
pub use factory::{materialize, CreateContext, MaterializedCreate};
pub use fees::FeeCategory;
pub use flows::{
    CreateResponse, DomainCreateCustomLogic, DomainCreateFlow, FeeEcho, FeeLine,
    LabelTriggeredMessage, NoCustomLogic,
};
pub use infrastructure::{
    CreateMutation, FlowMetric, FlowStatus, InMemoryMetricSink, InMemoryRegistryStore,
    MetricSink, NoopMetricSink, RegistryStore, StoreError, ICANN_DOMAIN_CREATE_FIELD,
};
pub use pricing::{price_create, CreatePrice};
pub use state_machine::{
    CreateFlowInput, CreateFlowOutput, CreateFlowState, MealyMachine, MealyStateTransitions,
    State, StateTransition,
};
pub use tasks::{plan_tasks, QueuedTask, TaskQueue};
pub use trademark::{InMemoryTrademarkValidator, SignedMarkData, TrademarkValidator};
pub use validation::{validate_create, AnchorSource, CreateInput, LoadedResources, ValidatedCreate};
