//! Domain event envelope lifecycle.
//!
//! A domain event is born *unrecorded* (no playhead, no recording time)
//! through its type's [`DomainEvent::occur`] factory, and becomes
//! *recorded* when the event store assigns it a playhead via
//! [`DomainEvent::record_now`]. Recording never mutates the receiver; it
//! yields a fresh value, so envelopes are safe to share across threads.

use chrono::{DateTime, Utc};

use crate::clock::{Clock, SystemClock};
use crate::error::EventError;
use crate::store::StoredEvent;

/// Event payload: a key-value map opaque to the kernel, interpreted only
/// by the concrete event type.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Shared lifecycle state carried by every concrete domain event.
///
/// `playhead` and `recorded_on` are either both absent (unrecorded) or
/// both present (recorded); they transition together, through
/// [`Envelope::recorded`], and never back. Fields are private and the
/// constructors are crate-internal, so a well-formed envelope can only be
/// obtained through [`DomainEvent::occur`] or deserialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    aggregate_id: String,
    payload: Payload,
    playhead: Option<u64>,
    recorded_on: Option<DateTime<Utc>>,
}

impl Envelope {
    /// Creates an unrecorded envelope.
    pub(crate) fn occur(aggregate_id: String, payload: Payload) -> Result<Self, EventError> {
        if aggregate_id.is_empty() {
            return Err(EventError::EmptyAggregateId);
        }
        Ok(Self {
            aggregate_id,
            payload,
            playhead: None,
            recorded_on: None,
        })
    }

    /// Returns a new envelope recorded at `playhead` with the clock's
    /// current time. The receiver is left unchanged.
    pub(crate) fn recorded(&self, playhead: u64, clock: &dyn Clock) -> Self {
        Self {
            aggregate_id: self.aggregate_id.clone(),
            payload: self.payload.clone(),
            playhead: Some(playhead),
            recorded_on: Some(clock.now()),
        }
    }

    /// Rebuilds a recorded envelope from its stored representation.
    ///
    /// A null stored playhead decodes as 0, matching the storage format's
    /// integer coercion. A missing recording timestamp is rejected: a
    /// stored record always describes a recorded event.
    pub(crate) fn from_stored(record: &StoredEvent) -> Result<Self, EventError> {
        let value: serde_json::Value = serde_json::from_str(&record.payload)
            .map_err(|e| EventError::MalformedPayload(e.to_string()))?;
        let serde_json::Value::Object(payload) = value else {
            return Err(EventError::MalformedPayload(
                "payload must decode to a key-value map".to_owned(),
            ));
        };
        let recorded_on = record
            .recorded_on
            .ok_or_else(|| EventError::InvalidRecordedTimestamp {
                aggregate_id: record.aggregate_id.clone(),
            })?;
        Ok(Self {
            aggregate_id: record.aggregate_id.clone(),
            payload,
            playhead: Some(record.playhead.unwrap_or(0)),
            recorded_on: Some(recorded_on),
        })
    }

    /// Flattens the envelope into its stored representation under the
    /// given type discriminator.
    pub(crate) fn to_stored(&self, event_type: &str) -> StoredEvent {
        StoredEvent {
            aggregate_id: self.aggregate_id.clone(),
            playhead: self.playhead,
            event: event_type.to_owned(),
            payload: serde_json::Value::Object(self.payload.clone()).to_string(),
            recorded_on: self.recorded_on,
        }
    }

    /// Returns the identifier of the aggregate this event belongs to.
    #[must_use]
    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    /// Returns the event-specific payload map.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns the position within the aggregate's stream, if recorded.
    #[must_use]
    pub fn playhead(&self) -> Option<u64> {
        self.playhead
    }

    /// Returns the recording time, if recorded.
    #[must_use]
    pub fn recorded_on(&self) -> Option<DateTime<Utc>> {
        self.recorded_on
    }
}

/// Trait implemented by every concrete domain event type.
///
/// A concrete type supplies its stable discriminator and the two envelope
/// plumbing methods; construction, recording, and decoding are provided.
/// The flat accessors (`aggregate_id`, `payload`, `playhead`,
/// `recorded_on`, `serialize`) come from the blanket [`AnyDomainEvent`]
/// implementation.
pub trait DomainEvent: Clone + Send + Sync + Sized + 'static {
    /// Stable type discriminator written into stored records. Changing it
    /// breaks deserialization of historical events.
    const EVENT_TYPE: &'static str;

    /// Wraps an envelope in the concrete event type.
    fn from_envelope(envelope: Envelope) -> Self;

    /// Returns the envelope carrying this event's lifecycle state.
    fn envelope(&self) -> &Envelope;

    /// Creates a new unrecorded event of this type.
    ///
    /// This is the only construction path for domain code; concrete types
    /// wrap it in intention-revealing named constructors.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::EmptyAggregateId`] if `aggregate_id` is empty.
    fn occur(aggregate_id: impl Into<String>, payload: Payload) -> Result<Self, EventError> {
        Ok(Self::from_envelope(Envelope::occur(
            aggregate_id.into(),
            payload,
        )?))
    }

    /// Returns a new event of the same type and content, recorded at
    /// `playhead` with the current wall-clock time. The receiver is left
    /// unchanged.
    ///
    /// Re-recording is not rejected here: calling this on an
    /// already-recorded value simply yields another recorded value. The
    /// event store is responsible for recording each event exactly once
    /// during persistence and is the source of ordering truth.
    #[must_use]
    fn record_now(&self, playhead: u64) -> Self {
        self.record_with(playhead, &SystemClock)
    }

    /// Like [`DomainEvent::record_now`], with an explicit time source.
    #[must_use]
    fn record_with(&self, playhead: u64, clock: &dyn Clock) -> Self {
        Self::from_envelope(self.envelope().recorded(playhead, clock))
    }

    /// Decodes a stored record into this concrete event type.
    ///
    /// # Errors
    ///
    /// - [`EventError::InvalidEventType`] if the record's `event` field is
    ///   not this type's discriminator.
    /// - [`EventError::MalformedPayload`] if the payload text does not
    ///   decode to a key-value map.
    /// - [`EventError::InvalidRecordedTimestamp`] if the record carries no
    ///   recording timestamp.
    fn deserialize(record: &StoredEvent) -> Result<Self, EventError> {
        if record.event != Self::EVENT_TYPE {
            return Err(EventError::InvalidEventType(record.event.clone()));
        }
        Ok(Self::from_envelope(Envelope::from_stored(record)?))
    }
}

/// Object-safe view of a domain event.
///
/// Blanket-implemented for every [`DomainEvent`], so concrete types get
/// the flat accessors for free, and deserialized events of mixed types can
/// be handled uniformly as `Box<dyn AnyDomainEvent>`.
pub trait AnyDomainEvent: Send + Sync {
    /// Returns the stable type discriminator.
    fn event_type(&self) -> &'static str;

    /// Returns the identifier of the aggregate this event belongs to.
    fn aggregate_id(&self) -> &str;

    /// Returns the event-specific payload map.
    fn payload(&self) -> &Payload;

    /// Returns the position within the aggregate's stream, if recorded.
    fn playhead(&self) -> Option<u64>;

    /// Returns the recording time, if recorded.
    fn recorded_on(&self) -> Option<DateTime<Utc>>;

    /// Flattens this event into its stored representation.
    fn serialize(&self) -> StoredEvent;

    /// Boxed counterpart of [`DomainEvent::record_with`], for recording
    /// events held behind the erased type.
    fn record(&self, playhead: u64, clock: &dyn Clock) -> Box<dyn AnyDomainEvent>;

    /// Upcasts to [`std::any::Any`] for downcasting to the concrete type.
    fn as_any(&self) -> &dyn std::any::Any;
}

impl<E: DomainEvent> AnyDomainEvent for E {
    fn event_type(&self) -> &'static str {
        E::EVENT_TYPE
    }

    fn aggregate_id(&self) -> &str {
        self.envelope().aggregate_id()
    }

    fn payload(&self) -> &Payload {
        self.envelope().payload()
    }

    fn playhead(&self) -> Option<u64> {
        self.envelope().playhead()
    }

    fn recorded_on(&self) -> Option<DateTime<Utc>> {
        self.envelope().recorded_on()
    }

    fn serialize(&self) -> StoredEvent {
        self.envelope().to_stored(E::EVENT_TYPE)
    }

    fn record(&self, playhead: u64, clock: &dyn Clock) -> Box<dyn AnyDomainEvent> {
        Box::new(self.record_with(playhead, clock))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct MessagePublished {
        envelope: Envelope,
    }

    impl DomainEvent for MessagePublished {
        const EVENT_TYPE: &'static str = "MessagePublished";

        fn from_envelope(envelope: Envelope) -> Self {
            Self { envelope }
        }

        fn envelope(&self) -> &Envelope {
            &self.envelope
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct ProfileCreated {
        envelope: Envelope,
    }

    impl DomainEvent for ProfileCreated {
        const EVENT_TYPE: &'static str = "ProfileCreated";

        fn from_envelope(envelope: Envelope) -> Self {
            Self { envelope }
        }

        fn envelope(&self) -> &Envelope {
            &self.envelope
        }
    }

    struct TestClock(chrono::DateTime<Utc>);

    impl Clock for TestClock {
        fn now(&self) -> chrono::DateTime<Utc> {
            self.0
        }
    }

    fn message_payload() -> Payload {
        serde_json::json!({"message": {"text": "hi"}})
            .as_object()
            .cloned()
            .unwrap()
    }

    // --- occur ---

    #[test]
    fn test_occur_produces_unrecorded_envelope() {
        let event = MessagePublished::occur("profile-42", message_payload()).unwrap();

        assert_eq!(event.aggregate_id(), "profile-42");
        assert_eq!(event.payload(), &message_payload());
        assert_eq!(event.playhead(), None);
        assert_eq!(event.recorded_on(), None);
    }

    #[test]
    fn test_occur_rejects_empty_aggregate_id() {
        let result = MessagePublished::occur("", message_payload());

        assert!(matches!(result, Err(EventError::EmptyAggregateId)));
    }

    // --- record_now / record_with ---

    #[test]
    fn test_record_now_sets_playhead_and_timestamp() {
        let event = MessagePublished::occur("profile-42", message_payload()).unwrap();

        let before = Utc::now();
        let recorded = event.record_now(3);
        let after = Utc::now();

        assert_eq!(recorded.playhead(), Some(3));
        let recorded_on = recorded.recorded_on().unwrap();
        assert!(recorded_on >= before);
        assert!(recorded_on <= after);
    }

    #[test]
    fn test_record_now_leaves_receiver_unchanged() {
        let event = MessagePublished::occur("profile-42", message_payload()).unwrap();

        let _recorded = event.record_now(3);

        assert_eq!(event.playhead(), None);
        assert_eq!(event.recorded_on(), None);
    }

    #[test]
    fn test_record_with_uses_clock() {
        let fixed_now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let event = MessagePublished::occur("profile-42", message_payload()).unwrap();

        let recorded = event.record_with(3, &TestClock(fixed_now));

        assert_eq!(recorded.recorded_on(), Some(fixed_now));
    }

    #[test]
    fn test_re_recording_yields_another_recorded_value() {
        let event = MessagePublished::occur("profile-42", message_payload()).unwrap();

        let first = event.record_now(3);
        let second = first.record_now(4);

        assert_eq!(first.playhead(), Some(3));
        assert_eq!(second.playhead(), Some(4));
        assert_eq!(second.aggregate_id(), "profile-42");
    }

    // --- serialize ---

    #[test]
    fn test_serialize_produces_flat_stored_record() {
        let fixed_now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let event = MessagePublished::occur("profile-42", message_payload())
            .unwrap()
            .record_with(3, &TestClock(fixed_now));

        let record = event.serialize();

        assert_eq!(record.aggregate_id, "profile-42");
        assert_eq!(record.playhead, Some(3));
        assert_eq!(record.event, "MessagePublished");
        assert_eq!(record.payload, r#"{"message":{"text":"hi"}}"#);
        assert_eq!(record.recorded_on, Some(fixed_now));
    }

    #[test]
    fn test_serialize_unrecorded_has_null_position_fields() {
        let event = MessagePublished::occur("profile-42", message_payload()).unwrap();

        let record = event.serialize();

        assert_eq!(record.playhead, None);
        assert_eq!(record.recorded_on, None);
    }

    // --- deserialize ---

    #[test]
    fn test_round_trip_preserves_all_fields() {
        let event = MessagePublished::occur("profile-42", message_payload())
            .unwrap()
            .record_now(3);

        let decoded = MessagePublished::deserialize(&event.serialize()).unwrap();

        assert_eq!(decoded, event);
    }

    #[test]
    fn test_deserialize_rejects_mismatched_event_type() {
        let event = MessagePublished::occur("profile-42", message_payload())
            .unwrap()
            .record_now(3);

        let result = ProfileCreated::deserialize(&event.serialize());

        match result {
            Err(EventError::InvalidEventType(name)) => assert_eq!(name, "MessagePublished"),
            other => panic!("expected InvalidEventType, got {other:?}"),
        }
    }

    #[test]
    fn test_deserialize_rejects_malformed_payload() {
        let mut record = MessagePublished::occur("profile-42", message_payload())
            .unwrap()
            .record_now(3)
            .serialize();
        record.payload = "{not json".to_owned();

        let result = MessagePublished::deserialize(&record);

        assert!(matches!(result, Err(EventError::MalformedPayload(_))));
    }

    #[test]
    fn test_deserialize_rejects_non_object_payload() {
        let mut record = MessagePublished::occur("profile-42", message_payload())
            .unwrap()
            .record_now(3)
            .serialize();
        record.payload = "[1, 2, 3]".to_owned();

        let result = MessagePublished::deserialize(&record);

        assert!(matches!(result, Err(EventError::MalformedPayload(_))));
    }

    #[test]
    fn test_deserialize_rejects_missing_recorded_timestamp() {
        let mut record = MessagePublished::occur("profile-42", message_payload())
            .unwrap()
            .record_now(3)
            .serialize();
        record.recorded_on = None;

        let result = MessagePublished::deserialize(&record);

        match result {
            Err(EventError::InvalidRecordedTimestamp { aggregate_id }) => {
                assert_eq!(aggregate_id, "profile-42");
            }
            other => panic!("expected InvalidRecordedTimestamp, got {other:?}"),
        }
    }

    #[test]
    fn test_deserialize_null_playhead_decodes_as_zero() {
        let mut record = MessagePublished::occur("profile-42", message_payload())
            .unwrap()
            .record_now(3)
            .serialize();
        record.playhead = None;

        let decoded = MessagePublished::deserialize(&record).unwrap();

        assert_eq!(decoded.playhead(), Some(0));
    }

    // --- ordering ---

    #[test]
    fn test_stored_playheads_preserve_relative_order() {
        let event = MessagePublished::occur("profile-42", message_payload()).unwrap();
        let fifth = event.record_now(5).serialize();
        let sixth = event.record_now(6).serialize();

        let mut records = vec![sixth.clone(), fifth.clone()];
        records.sort_by_key(|r| r.playhead);

        assert_eq!(records, vec![fifth, sixth]);
    }
}
