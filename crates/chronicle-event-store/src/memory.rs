//! In-memory `EventStore` and `SnapshotStore` implementations.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chronicle_core::clock::{Clock, SystemClock};
use chronicle_core::error::EventError;
use chronicle_core::event::AnyDomainEvent;
use chronicle_core::snapshot::Snapshot;
use chronicle_core::store::{EventStore, SnapshotStore, StoredEvent};

/// Event store backed by a per-aggregate vector of stored records.
///
/// The stream map's mutex is the per-stream serialization point: appends
/// to the same aggregate are assigned strictly increasing, gap-free
/// playheads starting at 0, and two concurrent appends can never receive
/// the same playhead. Methods panic if the mutex is poisoned.
pub struct InMemoryEventStore {
    streams: Mutex<HashMap<String, Vec<StoredEvent>>>,
    clock: Box<dyn Clock>,
}

impl InMemoryEventStore {
    /// Creates an empty store stamping recording times from the system
    /// clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Box::new(SystemClock))
    }

    /// Creates an empty store with an explicit time source.
    #[must_use]
    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self {
            streams: Mutex::new(HashMap::new()),
            clock,
        }
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn load(
        &self,
        aggregate_id: &str,
        from_playhead: u64,
    ) -> Result<Vec<StoredEvent>, EventError> {
        let streams = self.streams.lock().unwrap();
        let records: Vec<StoredEvent> = streams
            .get(aggregate_id)
            .map(|stream| {
                stream
                    .iter()
                    .filter(|record| record.playhead.unwrap_or(0) >= from_playhead)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        tracing::debug!(
            aggregate_id,
            from_playhead,
            count = records.len(),
            "loaded event stream"
        );
        Ok(records)
    }

    async fn append(&self, events: &[&dyn AnyDomainEvent]) -> Result<Vec<StoredEvent>, EventError> {
        let mut streams = self.streams.lock().unwrap();
        let mut appended = Vec::with_capacity(events.len());
        for event in events {
            let stream = streams.entry(event.aggregate_id().to_owned()).or_default();
            let playhead = stream.len() as u64;
            let record = event.record(playhead, self.clock.as_ref()).serialize();
            tracing::debug!(
                aggregate_id = %record.aggregate_id,
                playhead,
                event = %record.event,
                "appended event"
            );
            stream.push(record.clone());
            appended.push(record);
        }
        Ok(appended)
    }
}

/// Snapshot store backed by an (aggregate type, aggregate id) map.
///
/// Saving replaces any previous snapshot for the same aggregate; snapshots
/// are disposable caches. Methods panic if the mutex is poisoned.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    snapshots: Mutex<HashMap<(String, String), Snapshot>>,
}

impl InMemorySnapshotStore {
    /// Creates an empty snapshot store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn save(&self, snapshot: Snapshot) -> Result<(), EventError> {
        let key = (
            snapshot.aggregate_type().to_owned(),
            snapshot.aggregate_id().to_owned(),
        );
        tracing::debug!(
            aggregate_type = %key.0,
            aggregate_id = %key.1,
            playhead = snapshot.playhead(),
            "saved snapshot"
        );
        self.snapshots.lock().unwrap().insert(key, snapshot);
        Ok(())
    }

    async fn load(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
    ) -> Result<Option<Snapshot>, EventError> {
        let snapshots = self.snapshots.lock().unwrap();
        Ok(snapshots
            .get(&(aggregate_type.to_owned(), aggregate_id.to_owned()))
            .cloned())
    }
}
