//! # Ledger Client
use crate::ledger_actor::LedgerError;
use crate::model::{TenantId, Transaction, TransactionCreate, TransactionId};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Outcome of appending to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerWrite {
    Recorded(TransactionId),
    /// An entry with the same idempotency key exists; nothing was written.
    AlreadyRecorded,
}

/// Client for interacting with the Ledger actor.
#[derive(Clone)]
pub struct LedgerClient {
    inner: ResourceClient<Transaction>,
}

impl LedgerClient {
    pub fn new(inner: ResourceClient<Transaction>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ActorClient<Transaction> for LedgerClient {
    type Error = LedgerError;

    fn inner(&self) -> &ResourceClient<Transaction> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        e.downcast_entity::<LedgerError>()
            .unwrap_or_else(|e| LedgerError::ActorCommunicationError(e.to_string()))
    }
}

impl LedgerClient {
    #[instrument(skip(self), fields(tenant_id = %params.tenant_id, key = ?params.idempotency_key))]
    pub async fn record(&self, params: TransactionCreate) -> Result<LedgerWrite, LedgerError> {
        debug!("Sending request");
        match self.inner.create(params).await {
            Ok(id) => Ok(LedgerWrite::Recorded(id)),
            Err(FrameworkError::Conflict(key)) => {
                debug!(key = %key, "Ledger entry already recorded");
                Ok(LedgerWrite::AlreadyRecorded)
            }
            Err(e) => Err(Self::map_error(e)),
        }
    }

    /// The tenant's entries, oldest first.
    #[instrument(skip(self))]
    pub async fn list_for_tenant(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let mut entries: Vec<Transaction> = self
            .list()
            .await?
            .into_iter()
            .filter(|t| t.tenant_id == tenant_id)
            .collect();
        entries.sort_by_key(|t| (t.created_at, t.id.0));
        Ok(entries)
    }
}
