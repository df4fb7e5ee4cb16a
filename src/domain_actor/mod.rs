//! # Domain Actor
//!
//! The Domain Store. A domain name is the store's unique key, which makes
//! `AddDomain` a conditional insert: two tenants racing for `example.com` get exactly
//! one record between them.
//!
//! Verification state lives in a single [`DomainStatus`](crate::model::DomainStatus)
//! field and is only changed through [`DomainAction`]s.

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use entity::DomainUpdate;
pub use error::*;

use crate::model::Domain;
use actor_framework::{ResourceActor, ResourceClient};

/// Creates a new Domain actor and its client.
pub fn new() -> (ResourceActor<Domain>, ResourceClient<Domain>) {
    ResourceActor::new(64)
}
