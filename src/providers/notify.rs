use super::{BillingNotifier, PaymentFailure, ProviderError};
use async_trait::async_trait;
use tracing::warn;

/// Emits failed payments as warnings for the alerting pipeline.
pub struct LogNotifier;

#[async_trait]
impl BillingNotifier for LogNotifier {
    async fn payment_failed(&self, failure: &PaymentFailure) -> Result<(), ProviderError> {
        warn!(
            tenant_id = %failure.tenant_id,
            invoice_id = %failure.invoice_id,
            amount_due_cents = failure.amount_due_cents,
            currency = %failure.currency,
            attempt = failure.attempt_count,
            "Invoice payment failed"
        );
        Ok(())
    }
}
