// Copyright 2025 Cowboy AI, LLC.

//! Typed identifiers for registry entities

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use uuid::Uuid;

/// A typed entity identifier
///
/// The phantom type keeps a history-entry id from being passed where a billing-event id is
/// expected.
///
/// # Examples
///
/// ```rust
/// use registry_flows::entity::{EntityId, HistoryEntryMarker};
///
/// let id = EntityId::<HistoryEntryMarker>::new();
/// let same = EntityId::<HistoryEntryMarker>::from_uuid(*id.as_uuid());
/// assert_eq!(id, same);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId<T> {
    id: Uuid,
    #[serde(skip)]
    _phantom: PhantomData<T>,
}

impl<T> EntityId<T> {
    /// Create a new random entity ID
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            _phantom: PhantomData,
        }
    }

    /// Create an entity ID from a UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.id
    }
}

impl<T> fmt::Display for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> Default for EntityId<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> JsonSchema for EntityId<T> {
    fn schema_name() -> String {
        "EntityId".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        <Uuid as JsonSchema>::json_schema(gen)
    }
}

/// Marker for history entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HistoryEntryMarker;

/// Marker for billing events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BillingEventMarker;

/// Marker for poll messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PollMessageMarker;

/// Marker for enqueued tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskMarker;

/// Marker for command instances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandMarker;

/// History entry identifier
pub type HistoryEntryId = EntityId<HistoryEntryMarker>;
/// Billing event identifier
pub type BillingEventId = EntityId<BillingEventMarker>;
/// Poll message identifier
pub type PollMessageId = EntityId<PollMessageMarker>;
/// Task identifier
pub type TaskId = EntityId<TaskMarker>;
/// Command instance identifier
pub type CommandId = EntityId<CommandMarker>;

/// Registry object id (ROID): an upper-case hex serial plus the TLD's suffix, e.g. `2FA3-TLD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct RepoId(String);

impl RepoId {
    /// Build a repo id from a serial and a TLD suffix
    pub fn new(serial: u64, suffix: &str) -> Self {
        Self(format!("{serial:X}-{suffix}"))
    }

    /// Build a fresh repo id whose serial is drawn from a random UUID
    pub fn generate(suffix: &str) -> Self {
        let serial = (Uuid::new_v4().as_u128() & u64::MAX as u128) as u64;
        Self::new(serial, suffix)
    }

    /// The id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
