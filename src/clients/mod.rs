//! Typed clients over the store actors. Workflows hold clones of these and never
//! touch a `ResourceClient` directly.

pub mod domain_client;
pub mod event_log_client;
pub mod ledger_client;
pub mod subscription_client;
pub mod tenant_client;

pub use domain_client::DomainClient;
pub use event_log_client::{EventClaim, EventLogClient};
pub use ledger_client::{LedgerClient, LedgerWrite};
pub use subscription_client::SubscriptionClient;
pub use tenant_client::TenantClient;
