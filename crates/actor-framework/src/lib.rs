//! # Actor Framework
//!
//! Generic building blocks for the lifecycle stores: every record type (tenants,
//! domains, subscriptions, ledger entries, processed billing events) lives in its own
//! [`ResourceActor`], a Tokio task that owns the records and applies requests to them
//! one at a time.
//!
//! ## Why actors for stores
//!
//! - **No locks.** A store's state belongs to one task. Concurrency comes from running
//!   many actors, not from sharing one map.
//! - **Conditional updates for free.** A resource [`Action`](ActorEntity::Action) reads
//!   and writes the record with nothing interleaved, which is what status transitions,
//!   provisioning claims and verification results need.
//! - **Unique keys.** [`ActorEntity::unique_key`] makes `Create` a conditional insert:
//!   a slug, domain name or idempotency key can only be taken once.
//!
//! ## Core pieces
//!
//! | Type | Role |
//! |---|---|
//! | [`ActorEntity`] | Contract a record implements: create, update, delete hooks and actions |
//! | [`ResourceActor`] | Server half: owns the store and runs the message loop |
//! | [`ResourceClient`] | Cloneable sending half with an async API |
//! | [`ActorClient`] | Trait that gives typed clients `get`, `list` and `delete` |
//! | [`mock::MockClient`] | Scripted client for tests that don't need a running store |
//!
//! ## Lifecycle
//!
//! ```text
//! let (actor, client) = ResourceActor::<Tenant>::new(64);
//! let handle = tokio::spawn(actor.run(()));
//! // ... hand clones of `client` to the workflows ...
//! drop(client);            // last clone dropped -> loop ends
//! handle.await?;           // logs "Shutdown" with the final store size
//! ```

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;

pub use actor::ResourceActor;
pub use client::ResourceClient;
pub use client_trait::ActorClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{ResourceRequest, Response};
