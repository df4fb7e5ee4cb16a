//! # Provisioning Orchestrator
//!
//! Allocates a tenant's external resources in a fixed order and activates the tenant
//! once the critical ones exist. Each step's output is written to the Tenant actor
//! before the next step starts, so a run that stops halfway resumes where it left off.
//!
//! Runs on the same tenant are serialized by a leased claim on the tenant record; every
//! write a run makes is fenced on its run id, so a run whose lease expired cannot
//! overwrite the run that took over.

mod error;
pub mod steps;
mod workflow;

pub use error::ProvisioningError;
pub use steps::{ProvisioningStep, StepPolicy, PROVISIONING_STEPS};
pub use workflow::ProvisioningWorkflow;
