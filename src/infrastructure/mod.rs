// Copyright 2025 Cowboy AI, LLC.

//! Infrastructure layer
//!
//! Storage and metrics collaborators of the flows:
//! - The registry store contract with its transactional in-memory implementation
//! - Flow metrics and ICANN activity counting

pub mod metrics;
pub mod store;

pub use metrics::{
    FlowMetric, FlowStatus, InMemoryMetricSink, MetricSink, NoopMetricSink,
    ICANN_DOMAIN_CREATE_FIELD,
};
pub use store::{CreateMutation, InMemoryRegistryStore, RegistryStore, StoreError};
