use super::tenant::TenantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub u32);

impl From<u32> for TransactionId {
    fn from(id: u32) -> Self {
        TransactionId(id)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Subscription,
    TransactionFee,
    Sms,
    Email,
}

/// Append-only ledger entry. Amounts are in minor units of `currency`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub tenant_id: TenantId,
    pub amount_cents: i64,
    pub fee_cents: i64,
    pub currency: String,
    pub kind: TransactionKind,
    pub status: String,
    pub metadata: Value,
    /// External event id that produced this entry; unique across the ledger.
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TransactionCreate {
    pub tenant_id: TenantId,
    pub amount_cents: i64,
    pub fee_cents: i64,
    pub currency: String,
    pub kind: TransactionKind,
    pub status: String,
    pub metadata: Value,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}
