//! # Event Log Actor
//!
//! Idempotency records for inbound billing events. Creating a record *is* the claim:
//! the event id is the unique key, so of two concurrent deliveries of one event only
//! the first create succeeds and the other observes a conflict.
//!
//! A record goes `pending -> applied`. A pending record whose claim is older than the
//! configured TTL belongs to a delivery that died mid-way and can be reclaimed; a
//! pending record can also be deleted to release the claim after a failed effect.

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use entity::EventLogUpdate;
pub use error::*;

use crate::model::ProcessedEvent;
use actor_framework::{ResourceActor, ResourceClient};

/// Creates a new Event Log actor and its client.
pub fn new() -> (ResourceActor<ProcessedEvent>, ResourceClient<ProcessedEvent>) {
    ResourceActor::new(64)
}
