//! Event type registry for polymorphic deserialization.
//!
//! The registry maps each stable discriminator string to a descriptor of
//! the concrete event type, so stored records can be routed back to typed
//! envelopes. Registration happens once at start-up; afterwards the
//! registry is read-only and safe to share across threads without locking
//! (hand out `&EventTypeRegistry` or wrap it in an `Arc`).

use std::any::TypeId;
use std::collections::HashMap;

use crate::error::EventError;
use crate::event::{AnyDomainEvent, DomainEvent, Envelope};
use crate::store::StoredEvent;

type EventFactory = fn(Envelope) -> Box<dyn AnyDomainEvent>;

/// Descriptor of a registered concrete event type.
///
/// Whether a candidate implements the required event capability set is
/// checked once, at registration, by the `E: DomainEvent` bound on
/// [`EventTypeRegistry::register`] — not on every deserialize call.
pub struct EventType {
    discriminator: &'static str,
    type_id: TypeId,
    factory: EventFactory,
}

impl EventType {
    /// Returns the stable discriminator this descriptor is bound to.
    #[must_use]
    pub fn discriminator(&self) -> &'static str {
        self.discriminator
    }

    /// Returns true if this descriptor describes the concrete type `E`.
    #[must_use]
    pub fn is<E: DomainEvent>(&self) -> bool {
        self.type_id == TypeId::of::<E>()
    }

    /// Wraps an envelope in this descriptor's concrete type.
    #[must_use]
    pub fn make(&self, envelope: Envelope) -> Box<dyn AnyDomainEvent> {
        (self.factory)(envelope)
    }
}

impl std::fmt::Debug for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventType")
            .field("discriminator", &self.discriminator)
            .finish_non_exhaustive()
    }
}

/// Mapping from stable discriminator strings to concrete event types.
#[derive(Debug, Default)]
pub struct EventTypeRegistry {
    entries: HashMap<&'static str, EventType>,
}

impl EventTypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the event type `E` under its discriminator.
    ///
    /// Registering the same type again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::DuplicateRegistration`] if the discriminator
    /// is already bound to a different type.
    pub fn register<E: DomainEvent>(&mut self) -> Result<(), EventError> {
        if let Some(existing) = self.entries.get(E::EVENT_TYPE) {
            if existing.is::<E>() {
                return Ok(());
            }
            return Err(EventError::DuplicateRegistration {
                discriminator: E::EVENT_TYPE.to_owned(),
            });
        }
        self.entries.insert(
            E::EVENT_TYPE,
            EventType {
                discriminator: E::EVENT_TYPE,
                type_id: TypeId::of::<E>(),
                factory: |envelope| Box::new(E::from_envelope(envelope)),
            },
        );
        Ok(())
    }

    /// Looks up the descriptor bound to `discriminator`.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::UnknownEventType`] if nothing is registered
    /// under `discriminator`.
    pub fn resolve(&self, discriminator: &str) -> Result<&EventType, EventError> {
        self.entries
            .get(discriminator)
            .ok_or_else(|| EventError::UnknownEventType(discriminator.to_owned()))
    }

    /// Returns true if `discriminator` names a registered event type.
    #[must_use]
    pub fn contains(&self, discriminator: &str) -> bool {
        self.entries.contains_key(discriminator)
    }

    /// Returns true if the concrete type `E` is registered.
    #[must_use]
    pub fn is_registered<E: DomainEvent>(&self) -> bool {
        self.entries
            .get(E::EVENT_TYPE)
            .is_some_and(EventType::is::<E>)
    }

    /// Decodes a stored record into a typed event, selecting the concrete
    /// type by the record's `event` discriminator.
    ///
    /// # Errors
    ///
    /// - [`EventError::InvalidEventType`] if the record's `event` field
    ///   does not name a registered event type.
    /// - [`EventError::MalformedPayload`] if the payload text does not
    ///   decode to a key-value map.
    /// - [`EventError::InvalidRecordedTimestamp`] if the record carries no
    ///   recording timestamp.
    pub fn deserialize(&self, record: &StoredEvent) -> Result<Box<dyn AnyDomainEvent>, EventError> {
        let Some(entry) = self.entries.get(record.event.as_str()) else {
            return Err(EventError::InvalidEventType(record.event.clone()));
        };
        let envelope = Envelope::from_stored(record)?;
        Ok(entry.make(envelope))
    }
}
