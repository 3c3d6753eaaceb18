// Copyright 2025 Cowboy AI, LLC.

//! History entries: the transactional root of a mutating command.

use crate::entity::HistoryEntryId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of mutation recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryEntryType {
    /// A domain create
    DomainCreate,
}

/// ICANN transaction report field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionReportField {
    /// Net adds bucketed by registration years (1..=10)
    NetAdds {
        /// Years bucket
        years: u32,
    },
}

impl TransactionReportField {
    /// Column name, e.g. `NET_ADDS_2_YR`
    pub fn name(&self) -> String {
        match self {
            TransactionReportField::NetAdds { years } => format!("NET_ADDS_{years}_YR"),
        }
    }
}

/// One transaction report row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReportRecord {
    /// TLD reported against
    pub tld: String,
    /// When the record becomes reportable (end of the add grace period)
    pub reporting_time: DateTime<Utc>,
    /// Report field
    pub field: TransactionReportField,
    /// Amount added to the field
    pub amount: i32,
}

/// Reason and origin carried by the metadata extension
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMetadata {
    /// Free-text reason
    pub reason: Option<String>,
    /// Whether the registrar asked for the change
    pub requested_by_registrar: Option<bool>,
}

/// A record of one mutating command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Entry id
    pub id: HistoryEntryId,
    /// Kind
    pub entry_type: HistoryEntryType,
    /// Domain name
    pub target_id: String,
    /// Registration years
    pub period_years: u32,
    /// When the command ran
    pub modification_time: DateTime<Utc>,
    /// Registrar that issued it
    pub client_id: String,
    /// Client transaction id
    pub trid: String,
    /// Whether the caller was a superuser
    pub by_superuser: bool,
    /// Reason and origin when supplied
    pub metadata: HistoryMetadata,
    /// Report rows; empty for test TLDs
    pub transaction_records: Vec<TransactionReportRecord>,
}
