//! Error types for the Tenant actor.

use crate::model::TenantStatus;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during tenant operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TenantError {
    #[error("Tenant not found: {0}")]
    NotFound(String),

    /// Another tenant (live or soft-deleted) already owns the slug.
    #[error("Slug already taken: {0}")]
    SlugTaken(String),

    #[error("Invalid tenant: {0}")]
    Invalid(String),

    #[error("Tenant has been deleted")]
    TenantDeleted,

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: TenantStatus, to: TenantStatus },

    #[error("Tenant is {0}, expected provisioning")]
    NotProvisioning(TenantStatus),

    #[error("Provisioning already in progress (run {0})")]
    ProvisioningInProgress(Uuid),

    /// The writer's claim expired and another run took over.
    #[error("Provisioning claim not held by run {0}")]
    ClaimLost(Uuid),

    #[error("{0} already recorded")]
    AlreadyRecorded(&'static str),

    #[error("Cannot activate tenant without database and backend")]
    MissingResources,

    #[error("Tenant resources cannot be released while the tenant is {0}")]
    ResourcesInUse(TenantStatus),

    #[error("Tenants are soft-deleted only")]
    HardDeleteRefused,

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<String> for TenantError {
    fn from(msg: String) -> Self {
        TenantError::ActorCommunicationError(msg)
    }
}
