//! # Tenant Actor
//!
//! The Tenant Store: one [`ResourceActor`] holding every [`Tenant`] record.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](actor_framework::ActorEntity) implementation for [`Tenant`]
//! - [`actions`] - [`TenantAction`]: provisioning progress and status transitions
//! - [`error`] - [`TenantError`]
//!
//! ## Invariants held by the entity
//!
//! - the slug is unique across the store and never changes;
//! - status moves `provisioning -> active <-> suspended`, and anything `-> deleted`;
//! - `active` requires a database handle and backend endpoints;
//! - provisioning progress is written only by the run that holds the claim.
//!
//! ```rust
//! use aurelio_lifecycle::clients::TenantClient;
//! use aurelio_lifecycle::model::TenantCreate;
//! use aurelio_lifecycle::tenant_actor;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (actor, generic_client) = tenant_actor::new();
//!     let client = TenantClient::new(generic_client);
//!     tokio::spawn(actor.run(()));
//!
//!     let tenant = client
//!         .create_tenant(TenantCreate {
//!             name: "My Shop".into(),
//!             slug: "my-shop".into(),
//!             subdomain: "my-shop.aurelio.app".into(),
//!             owner_id: "user_1".into(),
//!             created_at: chrono::Utc::now(),
//!         })
//!         .await?;
//!     assert_eq!(tenant.slug, "my-shop");
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::model::Tenant;
use actor_framework::{ResourceActor, ResourceClient};

/// Creates a new Tenant actor and its client.
pub fn new() -> (ResourceActor<Tenant>, ResourceClient<Tenant>) {
    ResourceActor::new(64)
}
