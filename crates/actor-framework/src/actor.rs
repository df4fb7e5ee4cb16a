//! # Generic Actor Server
//!
//! This module defines the `ResourceActor`, the component that owns a store of entities
//! and processes requests against it one at a time.

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::ResourceRequest;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The generic actor that manages a collection of entities.
///
/// # Concurrency Model
/// Each actor runs in its own Tokio task and handles its messages sequentially, so the
/// store needs no `Mutex`. Two consequences the stores built on top rely on:
///
/// * **Atomic conditional updates.** An `Action` sees the entity's current state and
///   either changes it or refuses, with nothing interleaved.
/// * **Race-free uniqueness.** On `Create` the candidate's
///   [`unique_key`](ActorEntity::unique_key) is compared against every stored entity
///   before insertion; a clash answers [`FrameworkError::Conflict`] and stores nothing.
///
/// Updates and actions run against a working copy that replaces the stored entity only
/// when the hook succeeds, so a failed hook never leaves a half-applied change behind.
///
/// # Usage Pattern
///
/// ```rust
/// use actor_framework::{ActorEntity, FrameworkError, ResourceActor};
/// use async_trait::async_trait;
///
/// #[derive(Clone, Debug)] struct Shop { id: u32, slug: String }
/// #[derive(Debug)] struct ShopCreate { slug: String }
/// #[derive(Debug)] struct ShopUpdate;
/// #[derive(Debug)] enum ShopAction {}
/// #[derive(Debug, thiserror::Error)] #[error("shop error")] struct ShopError;
///
/// #[async_trait]
/// impl ActorEntity for Shop {
///     type Id = u32;
///     type Create = ShopCreate;
///     type Update = ShopUpdate;
///     type Action = ShopAction;
///     type ActionResult = ();
///     type Context = ();
///     type Error = ShopError;
///
///     fn from_create_params(id: u32, p: ShopCreate) -> Result<Self, Self::Error> {
///         Ok(Self { id, slug: p.slug })
///     }
///     fn unique_key(&self) -> Option<String> { Some(self.slug.clone()) }
///     async fn on_update(&mut self, _: ShopUpdate, _: &()) -> Result<(), Self::Error> { Ok(()) }
///     async fn handle_action(&mut self, _: ShopAction, _: &()) -> Result<(), Self::Error> { Ok(()) }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let (actor, client) = ResourceActor::<Shop>::new(10);
///     tokio::spawn(actor.run(()));
///
///     let id = client.create(ShopCreate { slug: "my-shop".into() }).await.unwrap();
///     let again = client.create(ShopCreate { slug: "my-shop".into() }).await;
///     assert!(matches!(again, Err(FrameworkError::Conflict(_))));
///
///     let found = client.find_by_key("my-shop").await.unwrap().unwrap();
///     assert_eq!(found.id, id);
/// }
/// ```
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    next_id: u32,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates the actor and the client connected to it.
    pub fn new(buffer_size: usize) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            next_id: 1,
        };
        let client = ResourceClient::new(sender);
        (actor, client)
    }

    fn key_taken(&self, key: &str) -> bool {
        self.store
            .values()
            .any(|existing| existing.unique_key().as_deref() == Some(key))
    }

    /// Runs the message loop until every client has been dropped.
    pub async fn run(mut self, context: T::Context) {
        // "crate::model::tenant::Tenant" -> "Tenant"
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    debug!(entity_type, ?params, "Create");
                    let id = T::Id::from(self.next_id);
                    self.next_id += 1;

                    let mut item = match T::from_create_params(id.clone(), params) {
                        Ok(item) => item,
                        Err(e) => {
                            warn!(entity_type, error = %e, "Create failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                            continue;
                        }
                    };

                    if let Some(key) = item.unique_key() {
                        if self.key_taken(&key) {
                            warn!(entity_type, key = %key, "Conflict");
                            let _ = respond_to.send(Err(FrameworkError::Conflict(key)));
                            continue;
                        }
                    }

                    if let Err(e) = item.on_create(&context).await {
                        warn!(entity_type, error = %e, "on_create failed");
                        let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        continue;
                    }
                    self.store.insert(id.clone(), item);
                    info!(entity_type, %id, size = self.store.len(), "Created");
                    let _ = respond_to.send(Ok(id));
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    debug!(entity_type, %id, found = item.is_some(), "Get");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::FindByKey { key, respond_to } => {
                    let item = self
                        .store
                        .values()
                        .find(|e| e.unique_key().as_deref() == Some(key.as_str()))
                        .cloned();
                    debug!(entity_type, key = %key, found = item.is_some(), "FindByKey");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::List { respond_to } => {
                    let items: Vec<T> = self.store.values().cloned().collect();
                    debug!(entity_type, count = items.len(), "List");
                    let _ = respond_to.send(Ok(items));
                }
                ResourceRequest::Update {
                    id,
                    update,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?update, "Update");
                    let Some(current) = self.store.get(&id) else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    let mut working = current.clone();
                    match working.on_update(update, &context).await {
                        Ok(()) => {
                            self.store.insert(id.clone(), working.clone());
                            info!(entity_type, %id, "Updated");
                            let _ = respond_to.send(Ok(working));
                        }
                        Err(e) => {
                            warn!(entity_type, %id, error = %e, "Update failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        }
                    }
                }
                ResourceRequest::Delete { id, respond_to } => {
                    debug!(entity_type, %id, "Delete");
                    let Some(item) = self.store.get(&id) else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    if let Err(e) = item.on_delete(&context).await {
                        warn!(entity_type, %id, error = %e, "on_delete failed");
                        let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        continue;
                    }
                    self.store.remove(&id);
                    info!(entity_type, %id, size = self.store.len(), "Deleted");
                    let _ = respond_to.send(Ok(()));
                }
                ResourceRequest::Action {
                    id,
                    action,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?action, "Action");
                    let Some(current) = self.store.get(&id) else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    let mut working = current.clone();
                    match working.handle_action(action, &context).await {
                        Ok(result) => {
                            self.store.insert(id.clone(), working);
                            info!(entity_type, %id, "Action ok");
                            let _ = respond_to.send(Ok(result));
                        }
                        Err(e) => {
                            warn!(entity_type, %id, error = %e, "Action failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        }
                    }
                }
            }
        }

        info!(entity_type, size = self.store.len(), "Shutdown");
    }
}
