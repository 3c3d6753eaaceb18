// Copyright 2025 Cowboy AI, LLC.

//! Pluggable per-registry logic run after materialisation and before the commit.

use crate::domain::poll::OneTimeMessage;
use crate::entity::PollMessageId;
use crate::errors::FlowResult;
use crate::factory::MaterializedCreate;
use chrono::{DateTime, Utc};

/// Hook invoked once per create attempt, before the commit
pub trait DomainCreateCustomLogic: Send + Sync {
    /// Extra one-time poll messages to persist in the same commit
    fn before_save(
        &self,
        created: &MaterializedCreate,
        now: DateTime<Utc>,
    ) -> FlowResult<Vec<OneTimeMessage>>;
}

/// Adds nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCustomLogic;

impl DomainCreateCustomLogic for NoCustomLogic {
    fn before_save(
        &self,
        _created: &MaterializedCreate,
        _now: DateTime<Utc>,
    ) -> FlowResult<Vec<OneTimeMessage>> {
        Ok(Vec::new())
    }
}

/// Sends the creating registrar a message when a given label is created
#[derive(Debug, Clone)]
pub struct LabelTriggeredMessage {
    label: String,
    message: String,
}

impl LabelTriggeredMessage {
    /// Send `message` whenever `label` is created under any TLD
    pub fn new(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            message: message.into(),
        }
    }
}

impl Default for LabelTriggeredMessage {
    fn default() -> Self {
        Self::new("custom-logic-test", "Custom logic was triggered")
    }
}

impl DomainCreateCustomLogic for LabelTriggeredMessage {
    fn before_save(
        &self,
        created: &MaterializedCreate,
        now: DateTime<Utc>,
    ) -> FlowResult<Vec<OneTimeMessage>> {
        let domain = &created.domain;
        let label = domain
            .fully_qualified_domain_name
            .split('.')
            .next()
            .unwrap_or_default();
        if label != self.label {
            return Ok(Vec::new());
        }
        Ok(vec![OneTimeMessage {
            id: PollMessageId::new(),
            client_id: domain.current_sponsor_client_id.clone(),
            event_time: now,
            message: self.message.clone(),
            response_data: Vec::new(),
            parent: created.history.id,
        }])
    }
}
