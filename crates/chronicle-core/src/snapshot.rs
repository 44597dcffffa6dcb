//! Snapshot records.

use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateRoot;
use crate::event::Payload;

/// A compact cache of an aggregate's materialized state at a playhead.
///
/// Pure value object: accessor-only after construction, no identity beyond
/// its fields, replaceable at will. A snapshot is only meaningful if its
/// playhead matches a real prefix of the aggregate's stream and its
/// payload re-hydrates through the same aggregate type's reconstruction
/// routine — the repository layer owns that correspondence; this type does
/// not validate it. Replay resumes at `playhead() + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    aggregate_type: String,
    aggregate_id: String,
    playhead: u64,
    payload: Payload,
}

impl Snapshot {
    /// Creates a snapshot from its parts.
    #[must_use]
    pub fn new(
        aggregate_type: impl Into<String>,
        aggregate_id: impl Into<String>,
        playhead: u64,
        payload: Payload,
    ) -> Self {
        Self {
            aggregate_type: aggregate_type.into(),
            aggregate_id: aggregate_id.into(),
            playhead,
            payload,
        }
    }

    /// Creates a snapshot of an aggregate's current state, stamping the
    /// aggregate's type tag, id, and playhead.
    #[must_use]
    pub fn of<A: AggregateRoot>(aggregate: &A, payload: Payload) -> Self {
        Self::new(
            A::AGGREGATE_TYPE,
            aggregate.aggregate_id(),
            aggregate.playhead(),
            payload,
        )
    }

    /// Returns the type tag of the aggregate kind this snapshot belongs to.
    #[must_use]
    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    /// Returns the aggregate identifier.
    #[must_use]
    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    /// Returns the playhead of the last event folded into the payload.
    #[must_use]
    pub fn playhead(&self) -> u64 {
        self.playhead
    }

    /// Returns the serialized aggregate state.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_payload() -> Payload {
        serde_json::json!({"messages": 7})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_accessors_return_constructor_arguments() {
        let snapshot = Snapshot::new("profile", "profile-42", 6, state_payload());

        assert_eq!(snapshot.aggregate_type(), "profile");
        assert_eq!(snapshot.aggregate_id(), "profile-42");
        assert_eq!(snapshot.playhead(), 6);
        assert_eq!(snapshot.payload(), &state_payload());
    }

    #[test]
    fn test_snapshots_with_identical_fields_are_equal() {
        let a = Snapshot::new("profile", "profile-42", 6, state_payload());
        let b = Snapshot::new("profile", "profile-42", 6, state_payload());

        assert_eq!(a, b);
    }

    #[test]
    fn test_snapshots_with_different_playheads_are_not_equal() {
        let a = Snapshot::new("profile", "profile-42", 6, state_payload());
        let b = Snapshot::new("profile", "profile-42", 7, state_payload());

        assert_ne!(a, b);
    }
}
