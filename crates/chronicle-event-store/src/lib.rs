//! In-memory store collaborators for the Chronicle engine.
//!
//! These stores implement the `EventStore` and `SnapshotStore` seams from
//! `chronicle-core` for tests and single-process use. Durable backends
//! live behind the same traits.

pub mod memory;

pub use memory::{InMemoryEventStore, InMemorySnapshotStore};
