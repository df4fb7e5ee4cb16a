use crate::event_log_actor::EventLogError;
use crate::ledger_actor::LedgerError;
use crate::providers::ProviderError;
use crate::subscription_actor::SubscriptionError;
use crate::tenant_actor::TenantError;
use thiserror::Error;

/// Rejections of an inbound webhook before any state is touched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("Webhook secret is not configured")]
    MissingSecret,

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Webhook timestamp outside tolerance ({age_secs}s)")]
    TimestampOutOfTolerance { age_secs: i64 },

    #[error("Malformed webhook payload: {0}")]
    Malformed(String),
}

/// Failures while applying a verified event. The event's claim is released, so a
/// redelivery retries it.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Subscription(#[from] SubscriptionError),

    #[error(transparent)]
    Tenant(#[from] TenantError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    EventLog(#[from] EventLogError),

    #[error("Payment failure notification failed: {0}")]
    Notifier(#[source] ProviderError),
}

