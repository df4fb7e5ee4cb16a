//! # Ledger Actor
//!
//! Append-only transaction ledger. Entries cannot be updated (the update and action
//! types are uninhabited) and deletes are refused. The external event id travels as
//! the entry's unique key, so a replayed `invoice.paid` cannot add a second row.

pub mod entity;
pub mod error;

pub use entity::{LedgerAction, LedgerUpdate};
pub use error::*;

use crate::model::Transaction;
use actor_framework::{ResourceActor, ResourceClient};

/// Creates a new Ledger actor and its client.
pub fn new() -> (ResourceActor<Transaction>, ResourceClient<Transaction>) {
    ResourceActor::new(64)
}
