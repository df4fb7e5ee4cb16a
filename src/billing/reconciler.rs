use super::error::ReconcileError;
use super::event::{
    tenant_from_metadata, BillingEvent, BillingEventKind, InvoicePayload, SubscriptionPayload,
};
use crate::clients::{
    EventClaim, EventLogClient, LedgerClient, LedgerWrite, SubscriptionClient, TenantClient,
};
use crate::lifecycle::config::PlatformConfig;
use crate::model::{
    Subscription, SubscriptionCreate, SubscriptionStatus, SubscriptionSync, TenantId,
    TransactionCreate, TransactionKind,
};
use crate::providers::{with_timeout, PaymentFailure, Providers};
use crate::subscription_actor::{SubscriptionChange, SubscriptionError};
use actor_framework::ActorClient;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// What applying an event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// The event was applied before, or another delivery is applying it now.
    Duplicate,
    /// Unknown event type, or nothing in it could be tied to a tenant.
    Ignored,
}

/// Applies billing provider events to subscriptions, tenants and the ledger, exactly
/// once per event id.
#[derive(Clone)]
pub struct BillingReconciler {
    tenants: TenantClient,
    subscriptions: SubscriptionClient,
    ledger: LedgerClient,
    events: EventLogClient,
    providers: Providers,
    config: Arc<PlatformConfig>,
}

impl BillingReconciler {
    pub fn new(
        tenants: TenantClient,
        subscriptions: SubscriptionClient,
        ledger: LedgerClient,
        events: EventLogClient,
        providers: Providers,
        config: Arc<PlatformConfig>,
    ) -> Self {
        Self {
            tenants,
            subscriptions,
            ledger,
            events,
            providers,
            config,
        }
    }

    #[instrument(
        skip(self, event),
        fields(event_id = %event.id, event_type = %event.kind.event_type())
    )]
    pub async fn apply(&self, event: &BillingEvent) -> Result<Outcome, ReconcileError> {
        if let BillingEventKind::Unknown(event_type) = &event.kind {
            info!(%event_type, "Unhandled billing event type");
            return Ok(Outcome::Ignored);
        }

        let claim = self
            .events
            .claim(
                &event.id,
                event.kind.event_type(),
                Utc::now(),
                self.config.event_claim_ttl_span(),
            )
            .await?;
        let record = match claim {
            EventClaim::Claimed(record) => record,
            EventClaim::AlreadyApplied | EventClaim::InFlight => {
                debug!(?claim, "Duplicate delivery");
                return Ok(Outcome::Duplicate);
            }
        };

        match self.dispatch(event).await {
            Ok(outcome) => {
                self.events.mark_applied(record, Utc::now()).await?;
                info!(?outcome, "Billing event reconciled");
                Ok(outcome)
            }
            Err(e) => {
                if let Err(release) = self.events.release(record).await {
                    warn!(error = %release, "Could not release event claim");
                }
                Err(e)
            }
        }
    }

    async fn dispatch(&self, event: &BillingEvent) -> Result<Outcome, ReconcileError> {
        match &event.kind {
            BillingEventKind::SubscriptionCreated(sub)
            | BillingEventKind::SubscriptionUpdated(sub) => {
                self.sync_subscription(event.created, sub).await
            }
            BillingEventKind::SubscriptionDeleted(sub) => {
                self.cancel_subscription(event.created, sub).await
            }
            BillingEventKind::InvoicePaid(invoice) => self.record_invoice(event, invoice).await,
            BillingEventKind::InvoicePaymentFailed(invoice) => {
                self.notify_payment_failed(invoice).await
            }
            BillingEventKind::Unknown(_) => Ok(Outcome::Ignored),
        }
    }

    /// Finds the local subscription an event refers to: by external handle first, then
    /// through the tenant named in the metadata.
    async fn locate(
        &self,
        sub: &SubscriptionPayload,
    ) -> Result<Option<Subscription>, ReconcileError> {
        if let Some(found) = self.subscriptions.find_by_external_id(&sub.id).await? {
            return Ok(Some(found));
        }
        match tenant_from_metadata(&sub.metadata) {
            Some(tenant_id) => Ok(self.subscriptions.for_tenant(tenant_id).await?),
            None => Ok(None),
        }
    }

    async fn sync_subscription(
        &self,
        event_at: DateTime<Utc>,
        sub: &SubscriptionPayload,
    ) -> Result<Outcome, ReconcileError> {
        let status = SubscriptionStatus::from_external(&sub.status);
        let sync = SubscriptionSync {
            external_id: sub.id.clone(),
            status,
            plan: sub.metadata.get("plan").cloned(),
            current_period_end: sub
                .current_period_end
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
            event_at,
        };

        let subscription = match self.locate(sub).await? {
            Some(found) => found,
            None => match self.adopt(sub).await? {
                Some(created) => created,
                None => return Ok(Outcome::Ignored),
            },
        };

        let change = match self.subscriptions.sync(subscription.id, sync).await {
            Ok(change) => change,
            Err(SubscriptionError::ExternalIdMismatch { bound, incoming }) => {
                warn!(
                    %bound,
                    %incoming,
                    tenant_id = %subscription.tenant_id,
                    "Event refers to a different subscription of this tenant"
                );
                return Ok(Outcome::Ignored);
            }
            Err(e) => return Err(e.into()),
        };
        self.cascade(&change).await?;
        Ok(Outcome::Applied)
    }

    /// Creates the subscription for a tenant that has none yet. It starts out like the
    /// default one provisioning registers; the event's own state is applied afterwards.
    async fn adopt(
        &self,
        sub: &SubscriptionPayload,
    ) -> Result<Option<Subscription>, ReconcileError> {
        let Some(tenant_id) = tenant_from_metadata(&sub.metadata) else {
            warn!(subscription = %sub.id, "Subscription event without a known tenant");
            return Ok(None);
        };
        if self.tenants.get(tenant_id).await?.is_none() {
            warn!(%tenant_id, subscription = %sub.id, "Subscription event for unknown tenant");
            return Ok(None);
        }

        let params = SubscriptionCreate {
            tenant_id,
            plan: sub
                .metadata
                .get("plan")
                .cloned()
                .unwrap_or_else(|| self.config.default_plan.clone()),
            status: SubscriptionStatus::Active,
            external_id: Some(sub.id.clone()),
            created_at: Utc::now(),
        };
        match self.subscriptions.create_subscription(params).await {
            Ok(_) | Err(SubscriptionError::AlreadyExists(_)) => {}
            Err(e) => return Err(e.into()),
        }
        Ok(self.subscriptions.for_tenant(tenant_id).await?)
    }

    /// Carries a subscription status change over to its tenant.
    async fn cascade(&self, change: &SubscriptionChange) -> Result<(), ReconcileError> {
        if !change.applied || change.subscription.status == change.previous {
            return Ok(());
        }
        let tenant_id = change.subscription.tenant_id;
        match change.subscription.status {
            SubscriptionStatus::Canceled => {
                let tenant = self.tenants.suspend(tenant_id).await?;
                info!(%tenant_id, status = %tenant.status, "Subscription canceled");
            }
            SubscriptionStatus::Active => {
                let tenant = self.tenants.reactivate(tenant_id).await?;
                info!(%tenant_id, status = %tenant.status, "Subscription active");
            }
            SubscriptionStatus::Paused => {
                info!(%tenant_id, "Subscription paused");
            }
        }
        Ok(())
    }

    async fn cancel_subscription(
        &self,
        event_at: DateTime<Utc>,
        sub: &SubscriptionPayload,
    ) -> Result<Outcome, ReconcileError> {
        let Some(subscription) = self.locate(sub).await? else {
            warn!(subscription = %sub.id, "Deleted subscription is not known here");
            return Ok(Outcome::Ignored);
        };
        let change = match self
            .subscriptions
            .cancel(subscription.id, &sub.id, event_at)
            .await
        {
            Ok(change) => change,
            Err(SubscriptionError::ExternalIdMismatch { bound, incoming }) => {
                warn!(
                    %bound,
                    %incoming,
                    tenant_id = %subscription.tenant_id,
                    "Deleted subscription is not the tenant's current one"
                );
                return Ok(Outcome::Ignored);
            }
            Err(e) => return Err(e.into()),
        };
        if change.applied {
            let tenant = self.tenants.suspend(subscription.tenant_id).await?;
            info!(tenant_id = %tenant.id, status = %tenant.status, "Subscription deleted");
        }
        Ok(Outcome::Applied)
    }

    async fn invoice_tenant(
        &self,
        invoice: &InvoicePayload,
    ) -> Result<Option<TenantId>, ReconcileError> {
        if let Some(handle) = &invoice.subscription {
            if let Some(sub) = self.subscriptions.find_by_external_id(handle).await? {
                return Ok(Some(sub.tenant_id));
            }
        }
        Ok(tenant_from_metadata(&invoice.metadata))
    }

    async fn record_invoice(
        &self,
        event: &BillingEvent,
        invoice: &InvoicePayload,
    ) -> Result<Outcome, ReconcileError> {
        let Some(tenant_id) = self.invoice_tenant(invoice).await? else {
            warn!(invoice = %invoice.id, "Paid invoice cannot be attributed to a tenant");
            return Ok(Outcome::Ignored);
        };

        let entry = TransactionCreate {
            tenant_id,
            amount_cents: invoice.amount_paid,
            fee_cents: 0,
            currency: invoice.currency.clone(),
            kind: TransactionKind::Subscription,
            status: "completed".to_string(),
            metadata: json!({
                "invoice_id": invoice.id,
                "period_start": invoice.period_start,
                "period_end": invoice.period_end,
            }),
            idempotency_key: Some(event.id.clone()),
            created_at: event.created,
        };
        match self.ledger.record(entry).await? {
            LedgerWrite::Recorded(id) => {
                info!(
                    %tenant_id,
                    transaction_id = %id,
                    amount_cents = invoice.amount_paid,
                    "Invoice payment recorded"
                );
            }
            LedgerWrite::AlreadyRecorded => debug!("Invoice payment was already recorded"),
        }
        Ok(Outcome::Applied)
    }

    async fn notify_payment_failed(
        &self,
        invoice: &InvoicePayload,
    ) -> Result<Outcome, ReconcileError> {
        let Some(tenant_id) = self.invoice_tenant(invoice).await? else {
            warn!(invoice = %invoice.id, "Failed invoice cannot be attributed to a tenant");
            return Ok(Outcome::Ignored);
        };
        let failure = PaymentFailure {
            tenant_id,
            invoice_id: invoice.id.clone(),
            amount_due_cents: invoice.amount_due,
            currency: invoice.currency.clone(),
            attempt_count: invoice.attempt_count,
        };
        with_timeout(
            "notifier",
            self.config.provider_timeout,
            self.providers.notifier.payment_failed(&failure),
        )
        .await
        .map_err(ReconcileError::Notifier)?;
        Ok(Outcome::Applied)
    }
}
