//! Local walkthrough of the tenant lifecycle: create a tenant, provision it, attach a
//! custom domain and feed it a signed billing event.
//!
//! Without provider credentials in the environment every external call goes to the
//! sandbox adapters, so this runs offline.

use aurelio_lifecycle::billing::signature_header;
use aurelio_lifecycle::lifecycle::{setup_tracing, ConfigBuilder, Platform};
use serde_json::json;
use tracing::{info, Instrument};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigBuilder::new()
        .with_auto_provision(false)
        .with_webhook_secret("whsec_local")
        .from_env()
        .build()?;
    setup_tracing(&config.logging);

    info!("Starting tenant lifecycle walkthrough");
    let mut platform = Platform::new(config);
    platform.start_verification_sweep();

    let tenant = platform
        .create_tenant("My Shop", "user_1")
        .instrument(tracing::info_span!("tenant_creation"))
        .await?;
    info!(tenant_id = %tenant.id, subdomain = %tenant.subdomain, "Tenant created");

    let tenant = platform
        .provision_tenant(tenant.id)
        .instrument(tracing::info_span!("provisioning"))
        .await?;
    info!(status = %tenant.status, integrations = ?tenant.integrations, "Tenant provisioned");

    let (domain, instructions) = platform.add_domain(tenant.id, "shop.example.com").await?;
    for record in &instructions.records {
        info!(
            record_type = ?record.record_type,
            name = %record.name,
            value = %record.value,
            "Publish DNS record"
        );
    }
    let check = platform.verify_domain(domain.id).await?;
    info!(verified = check.verified, ssl = check.ssl_enabled, "Domain checked");

    let secret = platform
        .config()
        .billing
        .webhook_secret
        .clone()
        .unwrap_or_default();
    let payload = serde_json::to_vec(&json!({
        "id": "evt_local_1",
        "type": "customer.subscription.created",
        "created": chrono::Utc::now().timestamp(),
        "data": { "object": {
            "id": "sub_local_1",
            "status": "active",
            "current_period_end": chrono::Utc::now().timestamp() + 30 * 24 * 3600,
            "metadata": { "tenant_id": tenant.id.to_string() }
        }}
    }))?;
    let header = signature_header(&secret, chrono::Utc::now().timestamp(), &payload);
    let outcome = platform.ingest_billing_event(&payload, Some(&header)).await?;
    info!(?outcome, "Billing event ingested");

    match platform.resolve_host(&tenant.subdomain).await? {
        Some(resolved) => info!(tenant_id = %resolved.id, "Subdomain resolves"),
        None => info!("Subdomain does not resolve"),
    }

    platform.shutdown().await?;
    Ok(())
}
