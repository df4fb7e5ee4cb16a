//! # Entity Contract
//!
//! [`ActorEntity`] is what a record type implements to be kept by a
//! [`ResourceActor`](crate::ResourceActor).

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any stored record must implement to be managed by `ResourceActor`.
///
/// # Architecture Note
/// Tenants, domains, subscriptions and ledger rows all satisfy this one contract, so the
/// store logic (id allocation, uniqueness, sequential mutation) is written once.
///
/// # Async & Context
/// Hooks are `async` and receive a `Context` injected at `run()` time. Stores that need
/// no collaborators use `()`.
#[async_trait]
pub trait ActorEntity: Clone + Send + Sync + 'static {
    /// Primary identifier. Generated by the actor from a `u32` counter.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug + From<u32>;

    /// The data required to create a new instance.
    type Create: Send + Sync + Debug;

    /// The data required to update an existing instance.
    ///
    /// Use an uninhabited type for append-only records.
    type Update: Send + Sync + Debug;

    /// Resource-specific operations (status transitions, conditional updates).
    type Action: Send + Sync + Debug;

    /// The result type returned by custom actions.
    type ActionResult: Send + Sync + Debug;

    /// The runtime context (dependencies) injected into the actor.
    type Context: Send + Sync;

    /// One error enum per entity, covering every operation on it.
    ///
    /// Clients get it back out of [`FrameworkError::EntityError`](crate::FrameworkError)
    /// by downcasting, so it must be `'static`.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the full entity from the id and payload.
    /// Called before the uniqueness check and before `on_create`.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    /// Secondary key that must be unique across the whole store (a slug, a domain name,
    /// an idempotency key). `None` opts the entity out of the check.
    ///
    /// The key must not change after creation; the actor only checks it on create.
    fn unique_key(&self) -> Option<String> {
        None
    }

    // --- Lifecycle Hooks (Async) ---

    /// Called after the entity passed the uniqueness check, before it is stored.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called when an update request is received.
    async fn on_update(
        &mut self,
        update: Self::Update,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error>;

    /// Called immediately before the entity is removed. Returning an error vetoes
    /// the delete.
    async fn on_delete(&self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    // --- Action Handler (Async) ---

    /// Handle a resource-specific action.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        _ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;
}
