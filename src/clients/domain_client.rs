//! # Domain Client
use crate::domain_actor::{DomainAction, DomainError};
use crate::model::{Domain, DomainCreate, DomainId, TenantId};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

/// Client for interacting with the Domain actor.
#[derive(Clone)]
pub struct DomainClient {
    inner: ResourceClient<Domain>,
}

impl DomainClient {
    pub fn new(inner: ResourceClient<Domain>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ActorClient<Domain> for DomainClient {
    type Error = DomainError;

    fn inner(&self) -> &ResourceClient<Domain> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e {
            FrameworkError::NotFound(id) => DomainError::NotFound(id),
            FrameworkError::Conflict(name) => DomainError::DomainTaken(name),
            other => other
                .downcast_entity::<DomainError>()
                .unwrap_or_else(|e| DomainError::ActorCommunicationError(e.to_string())),
        }
    }
}

impl DomainClient {
    #[instrument(skip(self), fields(name = %params.name))]
    pub async fn create_domain(&self, params: DomainCreate) -> Result<Domain, DomainError> {
        debug!("Sending request");
        let id = self.inner.create(params).await.map_err(Self::map_error)?;
        self.require(id).await
    }

    pub async fn require(&self, id: DomainId) -> Result<Domain, DomainError> {
        self.get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(id.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Domain>, DomainError> {
        self.inner.find_by_key(name).await.map_err(Self::map_error)
    }

    /// The tenant's domains, newest first.
    #[instrument(skip(self))]
    pub async fn list_for_tenant(&self, tenant_id: TenantId) -> Result<Vec<Domain>, DomainError> {
        let mut domains: Vec<Domain> = self
            .list()
            .await?
            .into_iter()
            .filter(|d| d.tenant_id == tenant_id)
            .collect();
        domains.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(domains)
    }

    pub async fn record_registration(
        &self,
        id: DomainId,
        handle: String,
    ) -> Result<Domain, DomainError> {
        self.inner
            .perform_action(id, DomainAction::RecordRegistration { handle })
            .await
            .map_err(Self::map_error)
    }

    /// Applies one check's outcome to both verification flags at once.
    pub async fn apply_check(
        &self,
        id: DomainId,
        verified: bool,
        tls_enabled: bool,
        checked_at: DateTime<Utc>,
    ) -> Result<Domain, DomainError> {
        self.inner
            .perform_action(
                id,
                DomainAction::ApplyCheck {
                    verified,
                    tls_enabled,
                    checked_at,
                },
            )
            .await
            .map_err(Self::map_error)
    }
}
