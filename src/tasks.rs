// Copyright 2025 Cowboy AI, LLC.

//! Tasks enqueued with a committed create: a DNS refresh and at most one LORDN upload.

use crate::entity::TaskId;
use crate::factory::MaterializedCreate;
use crate::validation::ValidatedCreate;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// LORDN class code for a registration
const LORDN_REGISTRATION_CLASS: &str = "1";

/// Queues a create can write to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskQueue {
    /// DNS refresh, keyed by name
    Dns,
    /// Sunrise LORDN upload
    LordnSunrise,
    /// Claims LORDN upload
    LordnClaims,
}

impl TaskQueue {
    /// Queue name
    pub fn name(&self) -> &'static str {
        match self {
            TaskQueue::Dns => "dns-pull",
            TaskQueue::LordnSunrise => "lordn-sunrise",
            TaskQueue::LordnClaims => "lordn-claims",
        }
    }
}

impl fmt::Display for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A task waiting on a queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedTask {
    /// Task id
    pub id: TaskId,
    /// Target queue
    pub queue: TaskQueue,
    /// Fully qualified name the task concerns
    pub tag: String,
    /// CSV payload for LORDN tasks
    pub payload: Option<String>,
}

impl QueuedTask {
    fn new(queue: TaskQueue, tag: impl Into<String>, payload: Option<String>) -> Self {
        Self {
            id: TaskId::new(),
            queue,
            tag: tag.into(),
            payload,
        }
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Tasks for a create, in enqueue order.
///
/// A held domain gets no DNS task. A signed mark yields a sunrise line; otherwise an acknowledged
/// claims notice yields a claims line.
pub fn plan_tasks(created: &MaterializedCreate, validated: &ValidatedCreate) -> Vec<QueuedTask> {
    let domain = &created.domain;
    let name = &domain.fully_qualified_domain_name;
    let mut tasks = Vec::new();
    if domain.should_publish_to_dns() {
        tasks.push(QueuedTask::new(TaskQueue::Dns, name.clone(), None));
    }

    let creation = timestamp(domain.creation_time);
    if let Some(mark) = &validated.signed_mark {
        let line = [
            domain.repo_id.as_str(),
            name.as_str(),
            mark.id.as_str(),
            LORDN_REGISTRATION_CLASS,
            creation.as_str(),
        ]
        .join(",");
        tasks.push(QueuedTask::new(TaskQueue::LordnSunrise, name.clone(), Some(line)));
    } else if let Some(notice) = &validated.launch_notice {
        let line = [
            domain.repo_id.as_str(),
            name.as_str(),
            notice.notice_id.as_str(),
            LORDN_REGISTRATION_CLASS,
            creation.as_str(),
            timestamp(notice.accepted_time).as_str(),
        ]
        .join(",");
        tasks.push(QueuedTask::new(TaskQueue::LordnClaims, name.clone(), Some(line)));
    }
    tasks
}
