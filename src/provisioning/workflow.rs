use super::error::ProvisioningError;
use super::steps::{
    ProvisioningStep, StepPolicy, EMAIL_INTEGRATION, PROVISIONING_STEPS, SMS_INTEGRATION,
};
use crate::clients::{SubscriptionClient, TenantClient};
use crate::lifecycle::config::PlatformConfig;
use crate::model::{
    ProvisioningFailure, SubscriptionCreate, SubscriptionStatus, Tenant, TenantId, TenantStatus,
};
use crate::providers::{with_timeout, ProviderError, Providers};
use crate::subscription_actor::SubscriptionError;
use actor_framework::ActorClient;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Drives a tenant from `provisioning` to `active` through [`PROVISIONING_STEPS`], and
/// releases a tenant's external resources on request.
#[derive(Clone)]
pub struct ProvisioningWorkflow {
    tenants: TenantClient,
    subscriptions: SubscriptionClient,
    providers: Providers,
    config: Arc<PlatformConfig>,
}

impl ProvisioningWorkflow {
    pub fn new(
        tenants: TenantClient,
        subscriptions: SubscriptionClient,
        providers: Providers,
        config: Arc<PlatformConfig>,
    ) -> Self {
        Self {
            tenants,
            subscriptions,
            providers,
            config,
        }
    }

    async fn load(&self, tenant_id: TenantId) -> Result<Tenant, ProvisioningError> {
        self.tenants
            .get(tenant_id)
            .await?
            .ok_or(ProvisioningError::TenantNotFound(tenant_id))
    }

    async fn claim(&self, tenant_id: TenantId, run_id: Uuid) -> Result<Tenant, ProvisioningError> {
        self.tenants
            .claim_provisioning(
                tenant_id,
                run_id,
                Utc::now(),
                self.config.provisioning_lease_span(),
            )
            .await
            .map_err(|e| ProvisioningError::from_claim(tenant_id, e))
    }

    /// Runs every step that has not completed yet, then activates the tenant, or
    /// suspends it when its subscription was canceled in the meantime.
    ///
    /// Safe to call again after a failure or crash: persisted handles are never
    /// re-allocated. A concurrent run on the same tenant gets
    /// [`ProvisioningError::AlreadyInProgress`].
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn provision(&self, tenant_id: TenantId) -> Result<Tenant, ProvisioningError> {
        let tenant = self.load(tenant_id).await?;
        if tenant.status != TenantStatus::Provisioning {
            return Err(ProvisioningError::InvalidState {
                tenant_id,
                status: tenant.status,
            });
        }

        let run_id = Uuid::new_v4();
        let mut tenant = self.claim(tenant_id, run_id).await?;
        info!(%run_id, "Provisioning claimed");

        for step in PROVISIONING_STEPS {
            match self.run_step(step, &tenant, run_id).await {
                Ok(Some(updated)) => {
                    tenant = updated;
                    info!(%step, "Step completed");
                }
                Ok(None) => debug!(%step, "Step already complete, skipping"),
                Err(ProvisioningError::ResourceAllocationFailed { step, source }) => {
                    match step.policy() {
                        StepPolicy::Continue => {
                            warn!(%step, error = %source, "Non-critical step failed, continuing");
                        }
                        StepPolicy::Halt => {
                            return Err(self.halt(tenant_id, run_id, step, source).await);
                        }
                    }
                }
                Err(e) => {
                    self.abandon(tenant_id, run_id).await;
                    return Err(e);
                }
            }
        }

        let canceled = match self.subscriptions.for_tenant(tenant_id).await {
            Ok(subscription) => {
                matches!(subscription, Some(s) if s.status == SubscriptionStatus::Canceled)
            }
            Err(e) => {
                self.abandon(tenant_id, run_id).await;
                return Err(e.into());
            }
        };
        match self
            .tenants
            .complete_provisioning(tenant_id, run_id, Utc::now(), canceled)
            .await
        {
            Ok(tenant) => {
                if canceled {
                    warn!("Subscription canceled during provisioning, tenant suspended");
                } else {
                    info!("Tenant active");
                }
                Ok(tenant)
            }
            Err(e) => {
                self.abandon(tenant_id, run_id).await;
                Err(e.into())
            }
        }
    }

    /// Executes one step. `Ok(None)` means the step's output already existed.
    /// Provider failures come back as [`ProvisioningError::ResourceAllocationFailed`].
    async fn run_step(
        &self,
        step: ProvisioningStep,
        tenant: &Tenant,
        run_id: Uuid,
    ) -> Result<Option<Tenant>, ProvisioningError> {
        if step.is_recorded(tenant) {
            return Ok(None);
        }
        let timeout = self.config.provider_timeout;
        let failed = |source: ProviderError| ProvisioningError::ResourceAllocationFailed {
            step,
            source,
        };

        let updated = match step {
            ProvisioningStep::AllocateDatabase => {
                let name = format!("aurelio-{}", tenant.slug);
                let handle = with_timeout(
                    "database",
                    timeout,
                    self.providers.databases.create_database(&name),
                )
                .await
                .map_err(failed)?;
                // The handle is persisted before anything else can fail, so a resumed run
                // sees it and skips this step.
                self.tenants
                    .record_database(tenant.id, run_id, handle)
                    .await?
            }
            ProvisioningStep::DeployBackend => {
                let connection_uri = tenant
                    .database
                    .as_ref()
                    .map(|db| db.connection_uri.as_str())
                    .ok_or_else(|| {
                        failed(ProviderError::Rejected {
                            provider: "deployment",
                            message: "no database recorded".into(),
                        })
                    })?;
                let endpoints = with_timeout(
                    "deployment",
                    timeout,
                    self.providers.deployments.deploy(tenant.id, connection_uri),
                )
                .await
                .map_err(failed)?;
                self.tenants
                    .record_backend(tenant.id, run_id, endpoints)
                    .await?
            }
            ProvisioningStep::EnableEmail => {
                let handle = with_timeout(
                    "email",
                    timeout,
                    self.providers.messaging.enable_email(tenant.id, &tenant.slug),
                )
                .await
                .map_err(failed)?;
                self.tenants
                    .record_integration(tenant.id, run_id, EMAIL_INTEGRATION, handle)
                    .await?
            }
            ProvisioningStep::EnableSms => {
                let handle = with_timeout(
                    "sms",
                    timeout,
                    self.providers.messaging.enable_sms(tenant.id, &tenant.slug),
                )
                .await
                .map_err(failed)?;
                self.tenants
                    .record_integration(tenant.id, run_id, SMS_INTEGRATION, handle)
                    .await?
            }
            ProvisioningStep::RegisterSubscription => {
                return self.register_subscription(tenant).await;
            }
        };
        Ok(Some(updated))
    }

    async fn register_subscription(
        &self,
        tenant: &Tenant,
    ) -> Result<Option<Tenant>, ProvisioningError> {
        if self.subscriptions.for_tenant(tenant.id).await?.is_some() {
            return Ok(None);
        }
        let params = SubscriptionCreate {
            tenant_id: tenant.id,
            plan: self.config.default_plan.clone(),
            status: SubscriptionStatus::Active,
            external_id: None,
            created_at: Utc::now(),
        };
        match self.subscriptions.create_subscription(params).await {
            // created by a billing event between our lookup and insert
            Ok(_) | Err(SubscriptionError::AlreadyExists(_)) => Ok(Some(tenant.clone())),
            Err(e) => Err(e.into()),
        }
    }

    /// Records a halting failure on the tenant, which also releases the claim.
    async fn halt(
        &self,
        tenant_id: TenantId,
        run_id: Uuid,
        step: ProvisioningStep,
        source: ProviderError,
    ) -> ProvisioningError {
        error!(%step, error = %source, "Provisioning halted");
        let failure = ProvisioningFailure {
            step: step.name().to_string(),
            message: source.to_string(),
            at: Utc::now(),
        };
        if let Err(e) = self.tenants.record_failure(tenant_id, run_id, failure).await {
            error!(error = %e, "Could not record provisioning failure");
        }
        ProvisioningError::ResourceAllocationFailed { step, source }
    }

    async fn abandon(&self, tenant_id: TenantId, run_id: Uuid) {
        if let Err(e) = self.tenants.release_provisioning(tenant_id, run_id).await {
            warn!(error = %e, "Could not release provisioning claim");
        }
    }

    /// Tears down the deployment and deletes the database of a deleted tenant, or of a
    /// failed provisioning no run currently holds. Handles stay on the tenant when an
    /// adapter call fails, so the cleanup can be retried.
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn cleanup(&self, tenant_id: TenantId) -> Result<Tenant, ProvisioningError> {
        let tenant = self.load(tenant_id).await?;
        match tenant.status {
            TenantStatus::Deleted => {
                self.release_resources(&tenant).await?;
                let tenant = self.tenants.clear_resources(tenant_id, None).await?;
                info!("Resources of deleted tenant released");
                Ok(tenant)
            }
            TenantStatus::Provisioning if tenant.is_failed() => {
                let run_id = Uuid::new_v4();
                let tenant = self.claim(tenant_id, run_id).await?;
                if let Err(e) = self.release_resources(&tenant).await {
                    self.abandon(tenant_id, run_id).await;
                    return Err(e);
                }
                self.tenants.clear_resources(tenant_id, Some(run_id)).await?;
                let tenant = self.tenants.release_provisioning(tenant_id, run_id).await?;
                info!("Resources of failed provisioning released");
                Ok(tenant)
            }
            status => Err(ProvisioningError::InvalidState { tenant_id, status }),
        }
    }

    async fn release_resources(&self, tenant: &Tenant) -> Result<(), ProvisioningError> {
        let timeout = self.config.provider_timeout;
        if tenant.backend.is_some() {
            with_timeout(
                "deployment",
                timeout,
                self.providers.deployments.teardown(tenant.id),
            )
            .await
            .map_err(|source| ProvisioningError::CleanupFailed {
                resource: "backend",
                source,
            })?;
        }
        if let Some(handle) = &tenant.database {
            with_timeout(
                "database",
                timeout,
                self.providers.databases.delete_database(handle),
            )
            .await
            .map_err(|source| ProvisioningError::CleanupFailed {
                resource: "database",
                source,
            })?;
        }
        Ok(())
    }
}
