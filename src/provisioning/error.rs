use super::steps::ProvisioningStep;
use crate::model::{TenantId, TenantStatus};
use crate::providers::ProviderError;
use crate::subscription_actor::SubscriptionError;
use crate::tenant_actor::TenantError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("Tenant not found: {0}")]
    TenantNotFound(TenantId),

    #[error("Tenant {tenant_id} is {status}, operation not allowed")]
    InvalidState {
        tenant_id: TenantId,
        status: TenantStatus,
    },

    #[error("Provisioning of {tenant_id} already in progress (run {run_id})")]
    AlreadyInProgress { tenant_id: TenantId, run_id: Uuid },

    #[error("Provisioning step {step} failed: {source}")]
    ResourceAllocationFailed {
        step: ProvisioningStep,
        #[source]
        source: ProviderError,
    },

    #[error("Releasing {resource} failed: {source}")]
    CleanupFailed {
        resource: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error(transparent)]
    Tenant(#[from] TenantError),

    #[error(transparent)]
    Subscription(#[from] SubscriptionError),
}

impl ProvisioningError {
    /// Maps the tenant store's refusal of a claim onto orchestrator errors.
    pub(crate) fn from_claim(tenant_id: TenantId, err: TenantError) -> Self {
        match err {
            TenantError::NotFound(_) => ProvisioningError::TenantNotFound(tenant_id),
            TenantError::NotProvisioning(status) => {
                ProvisioningError::InvalidState { tenant_id, status }
            }
            TenantError::ProvisioningInProgress(run_id) => {
                ProvisioningError::AlreadyInProgress { tenant_id, run_id }
            }
            other => ProvisioningError::Tenant(other),
        }
    }
}
