use crate::domain_actor::DomainError;
use crate::model::{DomainId, TenantId};
use crate::tenant_actor::TenantError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainWorkflowError {
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Domain already registered: {0}")]
    DomainTaken(String),

    #[error("Domain not found: {0}")]
    DomainNotFound(DomainId),

    #[error("Tenant not found: {0}")]
    TenantNotFound(TenantId),

    #[error("Tenant {0} has been deleted")]
    TenantDeleted(TenantId),

    #[error(transparent)]
    Store(#[from] DomainError),

    #[error(transparent)]
    Tenant(#[from] TenantError),
}
