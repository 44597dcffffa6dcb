//! Error types for the event-record lifecycle.

use thiserror::Error;

/// Top-level error type for event construction, (de)serialization, and
/// registry operations.
///
/// Every failure is reported synchronously at the offending operation;
/// nothing is retried or swallowed here. Whether a malformed stored record
/// is fatal corruption or a skippable legacy record is the calling store's
/// decision.
#[derive(Debug, Error)]
pub enum EventError {
    /// An event was constructed with an empty aggregate id.
    #[error("aggregate id must not be empty")]
    EmptyAggregateId,

    /// A stored record's `event` field does not name a registered event
    /// type, or does not match the type being decoded.
    #[error("invalid event type `{0}`")]
    InvalidEventType(String),

    /// A stored record's `payload` field could not be decoded into a
    /// key-value map.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A stored record has no valid recording timestamp.
    #[error("invalid recorded timestamp on stored event for aggregate {aggregate_id}")]
    InvalidRecordedTimestamp {
        /// The aggregate the offending record belongs to.
        aggregate_id: String,
    },

    /// Two event types claimed the same discriminator at registration.
    #[error("duplicate registration: `{discriminator}` is already bound to a different event type")]
    DuplicateRegistration {
        /// The contested discriminator.
        discriminator: String,
    },

    /// A registry lookup missed.
    #[error("unknown event type `{0}`")]
    UnknownEventType(String),
}
