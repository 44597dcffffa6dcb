//! Domain fixtures — a small profile/message domain used across tests.

use chronicle_core::aggregate::AggregateRoot;
use chronicle_core::error::EventError;
use chronicle_core::event::{AnyDomainEvent, DomainEvent, Envelope, Payload};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a profile aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProfileId(Uuid);

impl ProfileId {
    /// Generates a fresh random profile id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a profile id from its string form.
    ///
    /// # Panics
    ///
    /// Panics if `raw` is not a valid UUID; fixtures only ever see ids
    /// they produced themselves.
    #[must_use]
    pub fn from_string(raw: &str) -> Self {
        Self(raw.parse().expect("profile id must be a valid UUID"))
    }
}

impl std::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A message published to a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The message text.
    pub text: String,
}

impl Message {
    /// Creates a message with the given text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Emitted when a message is published to a profile.
#[derive(Debug, Clone, PartialEq)]
pub struct MessagePublished {
    envelope: Envelope,
}

impl MessagePublished {
    /// Named constructor: a message was published to `profile_id`.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::EmptyAggregateId`] if the id renders empty
    /// (it never does for a UUID-backed id).
    pub fn publish(profile_id: ProfileId, message: &Message) -> Result<Self, EventError> {
        let mut payload = Payload::new();
        payload.insert(
            "message".to_owned(),
            serde_json::to_value(message).expect("Message serialization is infallible"),
        );
        Self::occur(profile_id.to_string(), payload)
    }

    /// Returns the profile the message was published to.
    #[must_use]
    pub fn profile_id(&self) -> ProfileId {
        ProfileId::from_string(self.aggregate_id())
    }

    /// Re-hydrates the published message from the payload.
    ///
    /// # Panics
    ///
    /// Panics if the payload does not carry a `message` entry of the
    /// expected shape.
    #[must_use]
    pub fn message(&self) -> Message {
        let value = self.payload()["message"].clone();
        serde_json::from_value(value).expect("payload must carry a message")
    }
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

/// The profile aggregate: a stream of published messages.
#[derive(Debug)]
pub struct Profile {
    aggregate_id: String,
    events_applied: u64,
    messages: Vec<Message>,
    uncommitted_events: Vec<MessagePublished>,
}

impl Profile {
    /// Creates an empty profile.
    #[must_use]
    pub fn new(id: ProfileId) -> Self {
        Self {
            aggregate_id: id.to_string(),
            events_applied: 0,
            messages: Vec::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Publishes a message: emits and applies a [`MessagePublished`]
    /// event, leaving it uncommitted for the caller to persist.
    ///
    /// # Errors
    ///
    /// Returns [`EventError`] if event construction fails.
    pub fn publish_message(&mut self, message: Message) -> Result<(), EventError> {
        let event = MessagePublished::publish(ProfileId::from_string(&self.aggregate_id), &message)?;
        self.apply(&event);
        self.uncommitted_events.push(event);
        Ok(())
    }

    /// Returns the messages published so far.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

impl AggregateRoot for Profile {
    type Event = MessagePublished;

    const AGGREGATE_TYPE: &'static str = "profile";

    fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    fn playhead(&self) -> u64 {
        self.events_applied.saturating_sub(1)
    }

    fn apply(&mut self, event: &Self::Event) {
        self.messages.push(event.message());
        self.events_applied += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}
