//! Plain data types for every stored record, plus their create/update payloads.

pub mod domain;
pub mod event;
pub mod subscription;
pub mod tenant;
pub mod transaction;

pub use domain::*;
pub use event::*;
pub use subscription::*;
pub use tenant::*;
pub use transaction::*;
