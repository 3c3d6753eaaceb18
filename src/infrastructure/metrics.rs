// Copyright 2025 Cowboy AI, LLC.

//! Flow metrics and ICANN activity reporting

use crate::errors::ErrorCategory;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// ICANN monthly activity report field for domain creates
pub const ICANN_DOMAIN_CREATE_FIELD: &str = "srs-dom-create";

/// Outcome of a flow run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowStatus {
    /// Committed, or fully executed as a dry run
    Success,
    /// Rejected with an error of this category
    Failure(ErrorCategory),
}

/// One record per flow run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowMetric {
    /// Command name, e.g. `DomainCreate`
    pub command_name: String,
    /// Transaction attempts made
    pub attempts: u32,
    /// TLD of the target name when it resolved
    pub tld: Option<String>,
    /// Registrar of the session
    pub registrar_id: String,
    /// Outcome
    pub status: FlowStatus,
    /// ICANN activity field to increment on success
    pub icann_activity_field: Option<String>,
}

impl FlowMetric {
    /// Whether the run succeeded
    pub fn is_success(&self) -> bool {
        self.status == FlowStatus::Success
    }
}

/// Receives flow metrics
#[async_trait]
pub trait MetricSink: Send + Sync {
    /// Record one flow run
    async fn record(&self, metric: FlowMetric);
}

/// Keeps every metric and a counter per ICANN field; clones share state
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetricSink {
    metrics: Arc<RwLock<Vec<FlowMetric>>>,
    activity: Arc<RwLock<HashMap<String, u64>>>,
}

impl InMemoryMetricSink {
    /// Empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded metrics, oldest first
    pub async fn metrics(&self) -> Vec<FlowMetric> {
        self.metrics.read().await.clone()
    }

    /// Activity count for `(tld, field)`
    pub async fn activity_count(&self, tld: &str, field: &str) -> u64 {
        let activity = self.activity.read().await;
        activity.get(&activity_key(tld, field)).copied().unwrap_or(0)
    }
}

fn activity_key(tld: &str, field: &str) -> String {
    format!("{tld}/{field}")
}

#[async_trait]
impl MetricSink for InMemoryMetricSink {
    async fn record(&self, metric: FlowMetric) {
        if let (true, Some(tld), Some(field)) = (
            metric.is_success(),
            &metric.tld,
            &metric.icann_activity_field,
        ) {
            let mut activity = self.activity.write().await;
            *activity.entry(activity_key(tld, field)).or_insert(0) += 1;
        }
        self.metrics.write().await.push(metric);
    }
}

/// Discards metrics
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetricSink;

#[async_trait]
impl MetricSink for NoopMetricSink {
    async fn record(&self, _metric: FlowMetric) {}
}
