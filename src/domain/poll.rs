// Copyright 2025 Cowboy AI, LLC.

//! Poll messages queued for the registrar.

use crate::entity::{HistoryEntryId, PollMessageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result data for a pending action attached to a one-time message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingActionNotification {
    /// Domain name
    pub name: String,
    /// Whether the action succeeded
    pub action_result: bool,
    /// Client transaction id of the originating command
    pub trid: String,
    /// When the action was processed
    pub processed_date: DateTime<Utc>,
}

/// A poll message that repeats every year until `autorenew_end_time`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutorenewMessage {
    /// Message id
    pub id: PollMessageId,
    /// Registrar receiving the message
    pub client_id: String,
    /// Domain name
    pub target_id: String,
    /// First delivery time
    pub event_time: DateTime<Utc>,
    /// Last delivery; `DateTime::MAX_UTC` for unbounded
    pub autorenew_end_time: DateTime<Utc>,
    /// Text
    pub message: String,
    /// Owning history entry
    pub parent: HistoryEntryId,
}

/// A poll message delivered once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneTimeMessage {
    /// Message id
    pub id: PollMessageId,
    /// Registrar receiving the message
    pub client_id: String,
    /// Delivery time
    pub event_time: DateTime<Utc>,
    /// Text
    pub message: String,
    /// Pending-action data, if any
    pub response_data: Vec<PendingActionNotification>,
    /// Owning history entry
    pub parent: HistoryEntryId,
}

/// A poll message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollMessage {
    /// Yearly autorenew notice
    Autorenew(AutorenewMessage),
    /// One-off notice
    OneTime(OneTimeMessage),
}

impl PollMessage {
    /// Message id
    pub fn id(&self) -> PollMessageId {
        match self {
            PollMessage::Autorenew(message) => message.id,
            PollMessage::OneTime(message) => message.id,
        }
    }

    /// Text
    pub fn message(&self) -> &str {
        match self {
            PollMessage::Autorenew(message) => &message.message,
            PollMessage::OneTime(message) => &message.message,
        }
    }

    /// Delivery time
    pub fn event_time(&self) -> DateTime<Utc> {
        match self {
            PollMessage::Autorenew(message) => message.event_time,
            PollMessage::OneTime(message) => message.event_time,
        }
    }

    /// Owning history entry
    pub fn parent(&self) -> HistoryEntryId {
        match self {
            PollMessage::Autorenew(message) => message.parent,
            PollMessage::OneTime(message) => message.parent,
        }
    }

    /// Whether this is the autorenew message
    pub fn is_autorenew(&self) -> bool {
        matches!(self, PollMessage::Autorenew(_))
    }
}
