mod common;

use aurelio_lifecycle::billing::Outcome;
use aurelio_lifecycle::lifecycle::PlatformError;
use aurelio_lifecycle::model::{SubscriptionStatus, TenantStatus};
use aurelio_lifecycle::providers::sandbox::Behavior;
use aurelio_lifecycle::provisioning::{ProvisioningError, ProvisioningStep};
use aurelio_lifecycle::providers::ProviderError;
use common::{harness, signed};
use serde_json::json;

#[tokio::test]
async fn provisioning_activates_tenant_with_every_resource() {
    let h = harness();
    let tenant = h.platform.create_tenant("My Shop", "user_1").await.unwrap();
    assert_eq!(tenant.status, TenantStatus::Provisioning);

    let tenant = h.platform.provision_tenant(tenant.id).await.unwrap();

    assert_eq!(tenant.status, TenantStatus::Active);
    let database = tenant.database.as_ref().unwrap();
    assert_eq!(database.project_id, "mock-project-aurelio-my-shop");
    let backend = tenant.backend.as_ref().unwrap();
    assert!(backend.api_url.ends_with("/store"));
    assert!(backend.admin_url.ends_with("/app"));
    assert_eq!(tenant.integrations.get("email").map(String::as_str), Some("list-my-shop"));
    assert_eq!(tenant.integrations.get("sms").map(String::as_str), Some("sender-my-shop"));
    assert!(tenant.provisioning.claim.is_none());
    assert!(tenant.provisioning.completed_at.is_some());

    let subscription = h.platform.subscriptions().for_tenant(tenant.id).await.unwrap();
    assert_eq!(subscription.unwrap().plan, "standard");

    h.platform.shutdown().await.unwrap();
}

#[tokio::test]
async fn hung_deployment_fails_and_retry_reuses_database() {
    let h = harness();
    let tenant = h.platform.create_tenant("Slow Shop", "user_1").await.unwrap();
    h.deployments.set_behavior(Behavior::Hang);

    let err = h.platform.provision_tenant(tenant.id).await.unwrap_err();
    match err {
        PlatformError::Provisioning(ProvisioningError::ResourceAllocationFailed {
            step,
            source,
        }) => {
            assert_eq!(step, ProvisioningStep::DeployBackend);
            assert!(matches!(source, ProviderError::Timeout { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let failed = h.platform.get_tenant(tenant.id).await.unwrap().unwrap();
    assert!(failed.is_failed());
    assert!(failed.database.is_some(), "database handle persisted before the failure");
    assert!(failed.backend.is_none());
    assert!(failed.provisioning.claim.is_none());
    assert_eq!(failed.provisioning.failure.as_ref().unwrap().step, "deploy_backend");

    h.deployments.set_behavior(Behavior::Succeed);
    let tenant = h.platform.provision_tenant(tenant.id).await.unwrap();

    assert_eq!(tenant.status, TenantStatus::Active);
    assert!(tenant.provisioning.failure.is_none());
    assert_eq!(h.databases.created_count(), 1, "retry must not allocate a second database");
    assert_eq!(h.databases.live().len(), 1);

    h.platform.shutdown().await.unwrap();
}

#[tokio::test]
async fn concurrent_runs_are_refused() {
    let h = harness();
    let tenant = h.platform.create_tenant("Busy Shop", "user_1").await.unwrap();
    h.databases.set_behavior(Behavior::Hang);

    let (first, second) = tokio::join!(
        h.platform.provision_tenant(tenant.id),
        async {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            h.platform.provision_tenant(tenant.id).await
        }
    );

    assert!(matches!(
        second,
        Err(PlatformError::Provisioning(ProvisioningError::AlreadyInProgress { .. }))
    ));
    assert!(matches!(
        first,
        Err(PlatformError::Provisioning(ProvisioningError::ResourceAllocationFailed {
            step: ProvisioningStep::AllocateDatabase,
            ..
        }))
    ));
    assert_eq!(h.databases.created_count(), 0);

    h.platform.shutdown().await.unwrap();
}

#[tokio::test]
async fn optional_integration_failure_still_activates() {
    let h = harness();
    let tenant = h.platform.create_tenant("Quiet Shop", "user_1").await.unwrap();
    h.messaging.set_sms_behavior(Behavior::FailPermanent);

    let tenant = h.platform.provision_tenant(tenant.id).await.unwrap();

    assert_eq!(tenant.status, TenantStatus::Active);
    assert!(tenant.integrations.contains_key("email"));
    assert!(!tenant.integrations.contains_key("sms"));

    h.platform.shutdown().await.unwrap();
}

#[tokio::test]
async fn provisioning_an_active_tenant_is_rejected() {
    let h = harness();
    let tenant = h.platform.create_tenant("Done Shop", "user_1").await.unwrap();
    h.platform.provision_tenant(tenant.id).await.unwrap();

    let err = h.platform.provision_tenant(tenant.id).await.unwrap_err();
    assert!(matches!(
        err,
        PlatformError::Provisioning(ProvisioningError::InvalidState {
            status: TenantStatus::Active,
            ..
        })
    ));
    assert_eq!(h.deployments.deploy_calls(), 1);

    h.platform.shutdown().await.unwrap();
}

#[tokio::test]
async fn cleanup_releases_resources_of_failed_provisioning() {
    let h = harness();
    let tenant = h.platform.create_tenant("Broken Shop", "user_1").await.unwrap();
    h.deployments.set_behavior(Behavior::FailPermanent);
    h.platform.provision_tenant(tenant.id).await.unwrap_err();
    assert_eq!(h.databases.live().len(), 1);

    let tenant = h.platform.cleanup_tenant(tenant.id).await.unwrap();

    assert!(h.databases.live().is_empty());
    assert!(tenant.database.is_none());
    assert!(tenant.provisioning.claim.is_none());
    assert_eq!(tenant.status, TenantStatus::Provisioning);

    h.platform.shutdown().await.unwrap();
}

#[tokio::test]
async fn cleanup_of_deleted_tenant_tears_everything_down() {
    let h = harness();
    let tenant = h.platform.create_tenant("Gone Shop", "user_1").await.unwrap();
    h.platform.provision_tenant(tenant.id).await.unwrap();
    assert!(h.deployments.is_deployed(tenant.id));

    let err = h.platform.cleanup_tenant(tenant.id).await.unwrap_err();
    assert!(matches!(
        err,
        PlatformError::Provisioning(ProvisioningError::InvalidState { .. })
    ));

    h.platform.soft_delete_tenant(tenant.id).await.unwrap();
    let tenant = h.platform.cleanup_tenant(tenant.id).await.unwrap();

    assert!(!h.deployments.is_deployed(tenant.id));
    assert!(h.databases.live().is_empty());
    assert!(tenant.database.is_none() && tenant.backend.is_none());
    assert!(tenant.integrations.is_empty());

    h.platform.shutdown().await.unwrap();
}

#[tokio::test]
async fn failed_cleanup_keeps_handles_for_retry() {
    let h = harness();
    let tenant = h.platform.create_tenant("Sticky Shop", "user_1").await.unwrap();
    h.platform.provision_tenant(tenant.id).await.unwrap();
    h.platform.soft_delete_tenant(tenant.id).await.unwrap();

    h.databases.set_behavior(Behavior::FailTransient);
    let err = h.platform.cleanup_tenant(tenant.id).await.unwrap_err();
    assert!(matches!(
        err,
        PlatformError::Provisioning(ProvisioningError::CleanupFailed {
            resource: "database",
            ..
        })
    ));
    let kept = h.platform.get_tenant(tenant.id).await.unwrap().unwrap();
    assert!(kept.database.is_some());

    h.databases.set_behavior(Behavior::Succeed);
    let tenant = h.platform.cleanup_tenant(tenant.id).await.unwrap();
    assert!(tenant.database.is_none());
    assert!(h.databases.live().is_empty());

    h.platform.shutdown().await.unwrap();
}

#[tokio::test]
async fn subscription_canceled_before_activation_leaves_tenant_suspended() {
    let h = harness();
    let tenant = h.platform.create_tenant("Early Shop", "user_1").await.unwrap();

    for (event_id, event_type, status) in [
        ("evt_created", "customer.subscription.created", "active"),
        ("evt_deleted", "customer.subscription.deleted", "canceled"),
    ] {
        let event = json!({
            "id": event_id,
            "type": event_type,
            "created": chrono::Utc::now().timestamp(),
            "data": { "object": {
                "id": "sub_early",
                "status": status,
                "metadata": { "tenant_id": tenant.id.to_string() }
            }}
        });
        let (payload, header) = signed(&event);
        let outcome = h
            .platform
            .ingest_billing_event(&payload, Some(&header))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Applied);
    }
    let waiting = h.platform.get_tenant(tenant.id).await.unwrap().unwrap();
    assert_eq!(waiting.status, TenantStatus::Provisioning);

    let done = h.platform.provision_tenant(tenant.id).await.unwrap();
    assert_eq!(done.status, TenantStatus::Suspended);
    assert!(done.has_all_resources());
    assert!(done.provisioning.claim.is_none());
    assert!(h.platform.resolve_host("early-shop.aurelio.app").await.unwrap().is_none());

    let subscription = h
        .platform
        .subscriptions()
        .for_tenant(tenant.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(subscription.status, SubscriptionStatus::Canceled);

    h.platform.shutdown().await.unwrap();
}
