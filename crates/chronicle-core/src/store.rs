//! Stored event record and store abstractions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EventError;
use crate::event::AnyDomainEvent;
use crate::snapshot::Snapshot;

/// Canonical stored representation of a domain event.
///
/// This is the flat wire/storage shape persistence and messaging
/// collaborators exchange. Field names on the wire are camelCase; the
/// payload is the event's key-value map encoded as compact JSON text.
/// `playhead` and `recordedOn` are null for an event serialized before
/// recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    /// Identifier of the aggregate the event belongs to.
    pub aggregate_id: String,
    /// Position within the aggregate's stream, if recorded.
    pub playhead: Option<u64>,
    /// Stable type discriminator of the concrete event.
    pub event: String,
    /// Payload map encoded as compact JSON text.
    pub payload: String,
    /// Recording time, if recorded.
    pub recorded_on: Option<DateTime<Utc>>,
}

/// Store trait for appending and replaying an aggregate's event stream.
///
/// Implementations own the ordering contract: playheads for one aggregate
/// are assigned as a strictly increasing, gap-free sequence under a
/// serialization point, so two concurrent appends to the same aggregate
/// can never receive the same playhead.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Load the stored records for an aggregate with playhead >=
    /// `from_playhead`, ordered by playhead. Pass 0 for a full replay, or
    /// a snapshot's playhead + 1 to resume from it.
    ///
    /// # Errors
    ///
    /// Returns [`EventError`] if the underlying storage fails.
    async fn load(
        &self,
        aggregate_id: &str,
        from_playhead: u64,
    ) -> Result<Vec<StoredEvent>, EventError>;

    /// Record the given unrecorded events — assigning each the next
    /// playhead of its aggregate's stream and the current time — persist
    /// them, and return the stored records in append order.
    ///
    /// # Errors
    ///
    /// Returns [`EventError`] if the underlying storage fails.
    async fn append(&self, events: &[&dyn AnyDomainEvent]) -> Result<Vec<StoredEvent>, EventError>;
}

/// Store trait for snapshot records.
///
/// A snapshot is disposable: saving for an (aggregate type, id) pair
/// replaces any previous snapshot for that pair.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persist a snapshot, replacing any existing one for the same
    /// aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`EventError`] if the underlying storage fails.
    async fn save(&self, snapshot: Snapshot) -> Result<(), EventError>;

    /// Load the latest snapshot for an aggregate, if any.
    ///
    /// # Errors
    ///
    /// Returns [`EventError`] if the underlying storage fails.
    async fn load(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
    ) -> Result<Option<Snapshot>, EventError>;
}
