//! # Subscription Client
use crate::model::{
    Subscription, SubscriptionCreate, SubscriptionId, SubscriptionSync, TenantId,
};
use crate::subscription_actor::{SubscriptionAction, SubscriptionChange, SubscriptionError};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

/// Client for interacting with the Subscription actor.
#[derive(Clone)]
pub struct SubscriptionClient {
    inner: ResourceClient<Subscription>,
}

impl SubscriptionClient {
    pub fn new(inner: ResourceClient<Subscription>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ActorClient<Subscription> for SubscriptionClient {
    type Error = SubscriptionError;

    fn inner(&self) -> &ResourceClient<Subscription> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e {
            FrameworkError::NotFound(id) => SubscriptionError::NotFound(id),
            FrameworkError::Conflict(tenant) => SubscriptionError::AlreadyExists(tenant),
            other => other
                .downcast_entity::<SubscriptionError>()
                .unwrap_or_else(|e| SubscriptionError::ActorCommunicationError(e.to_string())),
        }
    }
}

impl SubscriptionClient {
    #[instrument(skip(self))]
    pub async fn create_subscription(
        &self,
        params: SubscriptionCreate,
    ) -> Result<SubscriptionId, SubscriptionError> {
        debug!("Sending request");
        self.inner.create(params).await.map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn for_tenant(
        &self,
        tenant_id: TenantId,
    ) -> Result<Option<Subscription>, SubscriptionError> {
        self.inner
            .find_by_key(&tenant_id.to_string())
            .await
            .map_err(Self::map_error)
    }

    /// Looks a subscription up by the billing provider's handle.
    #[instrument(skip(self))]
    pub async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Subscription>, SubscriptionError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|s| s.external_id.as_deref() == Some(external_id)))
    }

    pub async fn sync(
        &self,
        id: SubscriptionId,
        sync: SubscriptionSync,
    ) -> Result<SubscriptionChange, SubscriptionError> {
        self.inner
            .perform_action(id, SubscriptionAction::Sync(sync))
            .await
            .map_err(Self::map_error)
    }

    pub async fn cancel(
        &self,
        id: SubscriptionId,
        external_id: &str,
        event_at: DateTime<Utc>,
    ) -> Result<SubscriptionChange, SubscriptionError> {
        self.inner
            .perform_action(
                id,
                SubscriptionAction::Cancel {
                    external_id: external_id.to_string(),
                    event_at,
                },
            )
            .await
            .map_err(Self::map_error)
    }
}
