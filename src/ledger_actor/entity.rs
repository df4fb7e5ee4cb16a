use super::error::LedgerError;
use crate::model::{Transaction, TransactionCreate, TransactionId};
use actor_framework::ActorEntity;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub enum LedgerUpdate {}

#[derive(Debug, Clone)]
pub enum LedgerAction {}

#[async_trait]
impl ActorEntity for Transaction {
    type Id = TransactionId;
    type Create = TransactionCreate;
    type Update = LedgerUpdate;
    type Action = LedgerAction;
    type ActionResult = ();
    type Context = ();
    type Error = LedgerError;

    fn from_create_params(
        id: TransactionId,
        params: TransactionCreate,
    ) -> Result<Self, Self::Error> {
        if params.currency.trim().is_empty() {
            return Err(LedgerError::Invalid("currency must not be empty".into()));
        }
        if params.fee_cents < 0 {
            return Err(LedgerError::Invalid("fee must not be negative".into()));
        }
        Ok(Transaction {
            id,
            tenant_id: params.tenant_id,
            amount_cents: params.amount_cents,
            fee_cents: params.fee_cents,
            currency: params.currency.to_lowercase(),
            kind: params.kind,
            status: params.status,
            metadata: params.metadata,
            idempotency_key: params.idempotency_key,
            created_at: params.created_at,
        })
    }

    fn unique_key(&self) -> Option<String> {
        self.idempotency_key.clone()
    }

    async fn on_update(&mut self, update: LedgerUpdate, _ctx: &()) -> Result<(), LedgerError> {
        match update {}
    }

    async fn on_delete(&self, _ctx: &()) -> Result<(), LedgerError> {
        Err(LedgerError::Immutable)
    }

    async fn handle_action(&mut self, action: LedgerAction, _ctx: &()) -> Result<(), LedgerError> {
        match action {}
    }
}
