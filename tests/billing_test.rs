mod common;

use aurelio_lifecycle::billing::{signature_header, Outcome, ReconcileError, WebhookError};
use aurelio_lifecycle::lifecycle::{ConfigBuilder, PlatformError};
use aurelio_lifecycle::model::{SubscriptionStatus, Tenant, TenantStatus, TransactionKind};
use aurelio_lifecycle::providers::sandbox::Behavior;
use common::{harness, harness_with, signed, Harness, WEBHOOK_SECRET};
use serde_json::{json, Value};

async fn active_tenant(h: &Harness, name: &str) -> Tenant {
    let tenant = h.platform.create_tenant(name, "user_1").await.unwrap();
    h.platform.provision_tenant(tenant.id).await.unwrap()
}

fn subscription_event(
    event_id: &str,
    event_type: &str,
    subscription_id: &str,
    status: &str,
    tenant: &Tenant,
    created: i64,
) -> Value {
    json!({
        "id": event_id,
        "type": event_type,
        "created": created,
        "data": { "object": {
            "id": subscription_id,
            "status": status,
            "metadata": { "tenant_id": tenant.id.to_string() }
        }}
    })
}

fn invoice_event(event_id: &str, event_type: &str, tenant: Option<&Tenant>, created: i64) -> Value {
    let metadata = match tenant {
        Some(t) => json!({ "tenant_id": t.id.to_string() }),
        None => json!({}),
    };
    json!({
        "id": event_id,
        "type": event_type,
        "created": created,
        "data": { "object": {
            "id": "in_1",
            "amount_paid": 4900,
            "amount_due": 4900,
            "currency": "usd",
            "period_start": 1_700_000_000,
            "period_end": 1_702_592_000,
            "attempt_count": 2,
            "metadata": metadata
        }}
    })
}

async fn deliver(h: &Harness, event: &Value) -> Result<Outcome, PlatformError> {
    let (payload, header) = signed(event);
    h.platform.ingest_billing_event(&payload, Some(&header)).await
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[tokio::test]
async fn duplicate_invoice_delivery_records_one_transaction() {
    let h = harness();
    let tenant = active_tenant(&h, "My Shop").await;
    let event = invoice_event("evt_paid_1", "invoice.paid", Some(&tenant), now());

    assert_eq!(deliver(&h, &event).await.unwrap(), Outcome::Applied);
    assert_eq!(deliver(&h, &event).await.unwrap(), Outcome::Duplicate);

    let transactions = h.platform.list_transactions(tenant.id).await.unwrap();
    assert_eq!(transactions.len(), 1);
    let entry = &transactions[0];
    assert_eq!(entry.amount_cents, 4900);
    assert_eq!(entry.currency, "usd");
    assert_eq!(entry.kind, TransactionKind::Subscription);
    assert_eq!(entry.status, "completed");
    assert_eq!(entry.idempotency_key.as_deref(), Some("evt_paid_1"));
    assert_eq!(entry.metadata["invoice_id"], "in_1");

    h.platform.shutdown().await.unwrap();
}

#[tokio::test]
async fn deleted_subscription_suspends_only_its_tenant() {
    let h = harness();
    let target = active_tenant(&h, "Target Shop").await;
    let bystander = active_tenant(&h, "Bystander Shop").await;

    let event = subscription_event(
        "evt_del_1",
        "customer.subscription.deleted",
        "sub_target",
        "canceled",
        &target,
        now(),
    );
    assert_eq!(deliver(&h, &event).await.unwrap(), Outcome::Applied);

    let target = h.platform.get_tenant(target.id).await.unwrap().unwrap();
    let bystander = h.platform.get_tenant(bystander.id).await.unwrap().unwrap();
    assert_eq!(target.status, TenantStatus::Suspended);
    assert_eq!(bystander.status, TenantStatus::Active);

    let subscription = h
        .platform
        .subscriptions()
        .for_tenant(target.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(subscription.status, SubscriptionStatus::Canceled);

    h.platform.shutdown().await.unwrap();
}

#[tokio::test]
async fn deleting_a_replaced_subscription_keeps_tenant_serving() {
    let h = harness();
    let tenant = active_tenant(&h, "My Shop").await;

    let bind = subscription_event(
        "evt_bind",
        "customer.subscription.updated",
        "sub_new",
        "active",
        &tenant,
        now(),
    );
    assert_eq!(deliver(&h, &bind).await.unwrap(), Outcome::Applied);

    let old_deleted = subscription_event(
        "evt_del_old",
        "customer.subscription.deleted",
        "sub_old",
        "canceled",
        &tenant,
        now(),
    );
    assert_eq!(deliver(&h, &old_deleted).await.unwrap(), Outcome::Ignored);

    let current = h.platform.get_tenant(tenant.id).await.unwrap().unwrap();
    assert_eq!(current.status, TenantStatus::Active);
    let subscription = h
        .platform
        .subscriptions()
        .for_tenant(tenant.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(subscription.external_id.as_deref(), Some("sub_new"));
    assert_eq!(subscription.status, SubscriptionStatus::Active);

    h.platform.shutdown().await.unwrap();
}

#[tokio::test]
async fn older_events_do_not_roll_state_back() {
    let h = harness();
    let tenant = active_tenant(&h, "My Shop").await;
    let t0 = now();

    let canceled = subscription_event(
        "evt_2",
        "customer.subscription.updated",
        "sub_1",
        "canceled",
        &tenant,
        t0,
    );
    let stale_active = subscription_event(
        "evt_1",
        "customer.subscription.updated",
        "sub_1",
        "active",
        &tenant,
        t0 - 60,
    );
    assert_eq!(deliver(&h, &canceled).await.unwrap(), Outcome::Applied);
    assert_eq!(deliver(&h, &stale_active).await.unwrap(), Outcome::Applied);

    let current = h.platform.get_tenant(tenant.id).await.unwrap().unwrap();
    assert_eq!(current.status, TenantStatus::Suspended);
    let subscription = h
        .platform
        .subscriptions()
        .for_tenant(tenant.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(subscription.status, SubscriptionStatus::Canceled);
    assert_eq!(subscription.external_id.as_deref(), Some("sub_1"));

    let renewed = subscription_event(
        "evt_3",
        "customer.subscription.updated",
        "sub_1",
        "active",
        &tenant,
        t0 + 60,
    );
    assert_eq!(deliver(&h, &renewed).await.unwrap(), Outcome::Applied);
    let current = h.platform.get_tenant(tenant.id).await.unwrap().unwrap();
    assert_eq!(current.status, TenantStatus::Active);

    h.platform.shutdown().await.unwrap();
}

#[tokio::test]
async fn created_event_adopts_tenant_from_metadata() {
    let h = harness();
    // never provisioned, so no subscription exists yet
    let tenant = h.platform.create_tenant("Fresh Shop", "user_1").await.unwrap();

    let mut event = subscription_event(
        "evt_new_1",
        "customer.subscription.created",
        "sub_fresh",
        "active",
        &tenant,
        now(),
    );
    event["data"]["object"]["metadata"]["plan"] = json!("pro");
    assert_eq!(deliver(&h, &event).await.unwrap(), Outcome::Applied);

    let subscription = h
        .platform
        .subscriptions()
        .find_by_external_id("sub_fresh")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(subscription.tenant_id, tenant.id);
    assert_eq!(subscription.plan, "pro");
    assert_eq!(subscription.status, SubscriptionStatus::Active);

    h.platform.shutdown().await.unwrap();
}

#[tokio::test]
async fn events_without_a_tenant_are_ignored_once() {
    let h = harness();
    let event = invoice_event("evt_orphan", "invoice.paid", None, now());

    assert_eq!(deliver(&h, &event).await.unwrap(), Outcome::Ignored);
    assert_eq!(deliver(&h, &event).await.unwrap(), Outcome::Duplicate);

    let unknown = json!({
        "id": "evt_other",
        "type": "customer.created",
        "created": now(),
        "data": { "object": { "id": "cus_1" } }
    });
    assert_eq!(deliver(&h, &unknown).await.unwrap(), Outcome::Ignored);

    h.platform.shutdown().await.unwrap();
}

#[tokio::test]
async fn payment_failure_notifies_and_retries_after_notifier_outage() {
    let h = harness();
    let tenant = active_tenant(&h, "My Shop").await;
    let event = invoice_event("evt_failed_1", "invoice.payment_failed", Some(&tenant), now());

    h.notifier.set_behavior(Behavior::FailTransient);
    let err = deliver(&h, &event).await.unwrap_err();
    assert!(matches!(
        err,
        PlatformError::Reconcile(ReconcileError::Notifier(_))
    ));
    assert!(h.notifier.sent().is_empty());

    h.notifier.set_behavior(Behavior::Succeed);
    assert_eq!(deliver(&h, &event).await.unwrap(), Outcome::Applied);
    assert_eq!(deliver(&h, &event).await.unwrap(), Outcome::Duplicate);

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].tenant_id, tenant.id);
    assert_eq!(sent[0].invoice_id, "in_1");
    assert_eq!(sent[0].amount_due_cents, 4900);
    assert_eq!(sent[0].attempt_count, 2);

    // failed payments leave the tenant and the ledger alone
    let current = h.platform.get_tenant(tenant.id).await.unwrap().unwrap();
    assert_eq!(current.status, TenantStatus::Active);
    assert!(h.platform.list_transactions(tenant.id).await.unwrap().is_empty());

    h.platform.shutdown().await.unwrap();
}

#[tokio::test]
async fn forged_and_stale_signatures_are_rejected() {
    let h = harness();
    let tenant = active_tenant(&h, "My Shop").await;
    let event = invoice_event("evt_forged", "invoice.paid", Some(&tenant), now());
    let (payload, header) = signed(&event);

    let mut tampered = payload.clone();
    tampered.extend_from_slice(b" ");
    let err = h
        .platform
        .ingest_billing_event(&tampered, Some(&header))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PlatformError::Webhook(WebhookError::InvalidSignature)
    ));

    let old_header = signature_header(WEBHOOK_SECRET, now() - 3600, &payload);
    let err = h
        .platform
        .ingest_billing_event(&payload, Some(&old_header))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PlatformError::Webhook(WebhookError::TimestampOutOfTolerance { .. })
    ));

    let err = h.platform.ingest_billing_event(&payload, None).await.unwrap_err();
    assert!(matches!(
        err,
        PlatformError::Webhook(WebhookError::InvalidSignature)
    ));

    let wrong_secret = signature_header("whsec_other", now(), &payload);
    let err = h
        .platform
        .ingest_billing_event(&payload, Some(&wrong_secret))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PlatformError::Webhook(WebhookError::InvalidSignature)
    ));

    assert!(h.platform.list_transactions(tenant.id).await.unwrap().is_empty());

    // the genuine delivery still goes through
    assert_eq!(
        h.platform
            .ingest_billing_event(&payload, Some(&header))
            .await
            .unwrap(),
        Outcome::Applied
    );

    h.platform.shutdown().await.unwrap();
}

#[tokio::test]
async fn signed_garbage_is_malformed() {
    let h = harness();
    let payload = b"{not json".to_vec();
    let header = signature_header(WEBHOOK_SECRET, now(), &payload);

    let err = h
        .platform
        .ingest_billing_event(&payload, Some(&header))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Webhook(WebhookError::Malformed(_))));

    h.platform.shutdown().await.unwrap();
}

#[tokio::test]
async fn webhooks_need_a_configured_secret() {
    let h = harness_with(
        ConfigBuilder::new()
            .with_auto_provision(false)
            .with_provider_timeout(std::time::Duration::from_millis(200)),
    );
    let event = json!({
        "id": "evt_1",
        "type": "invoice.paid",
        "created": now(),
        "data": { "object": { "id": "in_1" } }
    });
    let (payload, header) = signed(&event);

    let err = h
        .platform
        .ingest_billing_event(&payload, Some(&header))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PlatformError::Webhook(WebhookError::MissingSecret)
    ));

    h.platform.shutdown().await.unwrap();
}
