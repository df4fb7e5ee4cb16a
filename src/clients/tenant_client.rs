//! # Tenant Client
//!
//! High-level API over the Tenant actor. Every status change and provisioning write
//! goes through a [`TenantAction`] so it is checked and applied in one step.
use crate::model::{
    BackendEndpoints, DatabaseHandle, ProvisioningFailure, Tenant, TenantCreate, TenantId,
    TenantUpdate,
};
use crate::tenant_actor::{TenantAction, TenantError};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Client for interacting with the Tenant actor.
#[derive(Clone)]
pub struct TenantClient {
    inner: ResourceClient<Tenant>,
}

impl TenantClient {
    pub fn new(inner: ResourceClient<Tenant>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ActorClient<Tenant> for TenantClient {
    type Error = TenantError;

    fn inner(&self) -> &ResourceClient<Tenant> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e {
            FrameworkError::NotFound(id) => TenantError::NotFound(id),
            FrameworkError::Conflict(slug) => TenantError::SlugTaken(slug),
            other => other
                .downcast_entity::<TenantError>()
                .unwrap_or_else(|e| TenantError::ActorCommunicationError(e.to_string())),
        }
    }
}

impl TenantClient {
    /// Inserts a tenant; the slug must be free.
    #[instrument(skip(self), fields(slug = %params.slug))]
    pub async fn create_tenant(&self, params: TenantCreate) -> Result<Tenant, TenantError> {
        debug!("Sending request");
        let id = self.inner.create(params).await.map_err(Self::map_error)?;
        self.require(id).await
    }

    /// Fetches a tenant, treating absence as an error.
    pub async fn require(&self, id: TenantId) -> Result<Tenant, TenantError> {
        self.get(id)
            .await?
            .ok_or_else(|| TenantError::NotFound(id.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, TenantError> {
        self.inner.find_by_key(slug).await.map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn update_tenant(
        &self,
        id: TenantId,
        update: TenantUpdate,
    ) -> Result<Tenant, TenantError> {
        self.inner.update(id, update).await.map_err(Self::map_error)
    }

    async fn act(&self, id: TenantId, action: TenantAction) -> Result<Tenant, TenantError> {
        debug!(tenant_id = %id, ?action, "Tenant action");
        self.inner
            .perform_action(id, action)
            .await
            .map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn claim_provisioning(
        &self,
        id: TenantId,
        run_id: Uuid,
        now: DateTime<Utc>,
        lease: Duration,
    ) -> Result<Tenant, TenantError> {
        self.act(id, TenantAction::ClaimProvisioning { run_id, now, lease })
            .await
    }

    pub async fn release_provisioning(
        &self,
        id: TenantId,
        run_id: Uuid,
    ) -> Result<Tenant, TenantError> {
        self.act(id, TenantAction::ReleaseProvisioning { run_id })
            .await
    }

    pub async fn record_database(
        &self,
        id: TenantId,
        run_id: Uuid,
        handle: DatabaseHandle,
    ) -> Result<Tenant, TenantError> {
        self.act(id, TenantAction::RecordDatabase { run_id, handle })
            .await
    }

    pub async fn record_backend(
        &self,
        id: TenantId,
        run_id: Uuid,
        endpoints: BackendEndpoints,
    ) -> Result<Tenant, TenantError> {
        self.act(id, TenantAction::RecordBackend { run_id, endpoints })
            .await
    }

    pub async fn record_integration(
        &self,
        id: TenantId,
        run_id: Uuid,
        name: &str,
        handle: String,
    ) -> Result<Tenant, TenantError> {
        self.act(
            id,
            TenantAction::RecordIntegration {
                run_id,
                name: name.to_string(),
                handle,
            },
        )
        .await
    }

    pub async fn record_failure(
        &self,
        id: TenantId,
        run_id: Uuid,
        failure: ProvisioningFailure,
    ) -> Result<Tenant, TenantError> {
        self.act(id, TenantAction::RecordFailure { run_id, failure })
            .await
    }

    pub async fn complete_provisioning(
        &self,
        id: TenantId,
        run_id: Uuid,
        now: DateTime<Utc>,
        suspend: bool,
    ) -> Result<Tenant, TenantError> {
        self.act(
            id,
            TenantAction::CompleteProvisioning {
                run_id,
                now,
                suspend,
            },
        )
        .await
    }

    pub async fn clear_resources(
        &self,
        id: TenantId,
        run_id: Option<Uuid>,
    ) -> Result<Tenant, TenantError> {
        self.act(id, TenantAction::ClearResources { run_id }).await
    }

    /// `active -> suspended`; returns the tenant unchanged in any other state.
    #[instrument(skip(self))]
    pub async fn suspend(&self, id: TenantId) -> Result<Tenant, TenantError> {
        self.act(id, TenantAction::Suspend).await
    }

    /// `suspended -> active`; returns the tenant unchanged in any other state.
    #[instrument(skip(self))]
    pub async fn reactivate(&self, id: TenantId) -> Result<Tenant, TenantError> {
        self.act(id, TenantAction::Reactivate).await
    }

    #[instrument(skip(self))]
    pub async fn soft_delete(&self, id: TenantId) -> Result<Tenant, TenantError> {
        self.act(id, TenantAction::SoftDelete).await
    }
}
