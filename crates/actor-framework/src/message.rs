//! # Generic Messages
//!
//! The request envelope exchanged between a [`ResourceClient`](crate::ResourceClient)
//! and its [`ResourceActor`](crate::ResourceActor).

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Request sent to an actor.
///
/// The variants cover the lifecycle every stored record shares (create, read,
/// update, delete), two store-wide reads (`List`, `FindByKey`) and a resource-specific
/// `Action`. Actions are the place for conditional updates: the entity inspects its own
/// state and either applies the change or refuses it, with no other request
/// interleaved.
///
/// The enum is generic over `T: ActorEntity`, so a tenant payload can never be sent to
/// the domain store.
#[derive(Debug)]
pub enum ResourceRequest<T: ActorEntity> {
    Create {
        params: T::Create,
        respond_to: Response<T::Id>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    /// Look an entity up by its [`ActorEntity::unique_key`].
    FindByKey {
        key: String,
        respond_to: Response<Option<T>>,
    },
    /// Snapshot of every entity in the store.
    List { respond_to: Response<Vec<T>> },
    Update {
        id: T::Id,
        update: T::Update,
        respond_to: Response<T>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<()>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
}
