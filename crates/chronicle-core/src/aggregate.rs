//! Aggregate root abstraction.
//!
//! The concrete aggregate base lives outside this crate; this is the seam
//! the event store, repository, and snapshot store collaborate through.

use crate::event::DomainEvent;

/// Trait for aggregate roots that reconstitute from event history.
pub trait AggregateRoot: Send + Sync {
    /// The event type this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Stable type tag identifying the aggregate kind, stamped on
    /// snapshots of this aggregate.
    const AGGREGATE_TYPE: &'static str;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> &str;

    /// Returns the playhead of the last event applied, or 0 for an
    /// aggregate with no history.
    fn playhead(&self) -> u64;

    /// Apply an event to mutate internal state (used during
    /// reconstitution and after command handling).
    fn apply(&mut self, event: &Self::Event);

    /// Returns uncommitted events produced by command handling.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Clears uncommitted events after persistence.
    fn clear_uncommitted_events(&mut self);
}
