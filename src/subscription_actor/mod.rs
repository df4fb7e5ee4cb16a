//! # Subscription Actor
//!
//! Plan subscriptions, one per tenant (the tenant id is the unique key). Created with
//! the plan default during provisioning and afterwards moved only by billing events,
//! which carry the provider's handle and a timestamp used to drop out-of-order
//! deliveries.

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use entity::SubscriptionUpdate;
pub use error::*;

use crate::model::Subscription;
use actor_framework::{ResourceActor, ResourceClient};

/// Creates a new Subscription actor and its client.
pub fn new() -> (ResourceActor<Subscription>, ResourceClient<Subscription>) {
    ResourceActor::new(64)
}
