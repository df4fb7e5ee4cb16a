//! # ActorClient Trait
//!
//! Common surface for resource-specific clients: `get`, `list` and `delete` come for
//! free once a client exposes its inner [`ResourceClient`] and an error mapping.
use crate::{ActorEntity, FrameworkError, ResourceClient};
use async_trait::async_trait;

/// Trait for resource-specific clients to inherit standard reads and deletes.
///
/// # Example
///
/// ```rust
/// use actor_framework::{ActorClient, ActorEntity, FrameworkError, ResourceClient};
/// use async_trait::async_trait;
///
/// #[derive(Clone, Debug)]
/// struct Mailbox { id: u32 }
/// #[derive(Debug)] struct MailboxCreate;
/// #[derive(Debug)] struct MailboxUpdate;
/// #[derive(Debug)] enum MailboxAction {}
///
/// #[derive(Debug, thiserror::Error)]
/// enum MailboxError {
///     #[error("Actor communication error: {0}")]
///     ActorCommunicationError(String),
/// }
///
/// impl From<String> for MailboxError {
///     fn from(s: String) -> Self { MailboxError::ActorCommunicationError(s) }
/// }
///
/// #[async_trait]
/// impl ActorEntity for Mailbox {
///     type Id = u32;
///     type Create = MailboxCreate;
///     type Update = MailboxUpdate;
///     type Action = MailboxAction;
///     type ActionResult = ();
///     type Context = ();
///     type Error = MailboxError;
///
///     fn from_create_params(id: u32, _: MailboxCreate) -> Result<Self, Self::Error> {
///         Ok(Self { id })
///     }
///     async fn on_update(&mut self, _: MailboxUpdate, _: &()) -> Result<(), Self::Error> { Ok(()) }
///     async fn handle_action(&mut self, _: MailboxAction, _: &()) -> Result<(), Self::Error> { Ok(()) }
/// }
///
/// struct MailboxClient {
///     inner: ResourceClient<Mailbox>,
/// }
///
/// #[async_trait]
/// impl ActorClient<Mailbox> for MailboxClient {
///     type Error = MailboxError;
///
///     fn inner(&self) -> &ResourceClient<Mailbox> {
///         &self.inner
///     }
///
///     fn map_error(e: FrameworkError) -> Self::Error {
///         MailboxError::ActorCommunicationError(e.to_string())
///     }
/// }
///
/// async fn usage(client: MailboxClient) {
///     // provided by the trait
///     let _ = client.get(1).await;
///     let _ = client.list().await;
///     let _ = client.delete(1).await;
/// }
/// ```
#[async_trait]
pub trait ActorClient<T: ActorEntity>: Send + Sync {
    /// The resource-specific error type.
    type Error: From<String> + Send + Sync;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Map framework errors to the specific resource error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Fetch an entity by ID.
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: T::Id) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id).await.map_err(Self::map_error)
    }

    /// Fetch every entity in the store.
    #[tracing::instrument(skip(self))]
    async fn list(&self) -> Result<Vec<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().list().await.map_err(Self::map_error)
    }

    /// Delete an entity by ID.
    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: T::Id) -> Result<(), Self::Error> {
        tracing::debug!("Sending request");
        self.inner().delete(id).await.map_err(Self::map_error)
    }
}
