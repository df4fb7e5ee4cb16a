//! # Domain Verification Orchestrator
//!
//! Adds, verifies and removes tenants' custom domains. Verification asks the DNS
//! provider when the domain is registered there and falls back to resolving the apex
//! record directly otherwise.

mod error;
pub mod fqdn;
mod instructions;
mod workflow;

pub use error::DomainWorkflowError;
pub use instructions::dns_instructions;
pub use workflow::DomainWorkflow;
