use super::config::PlatformConfig;
use super::scheduler::spawn_verification_sweep;
use crate::billing::{
    verify_signature, BillingEvent, BillingReconciler, Outcome, ReconcileError, WebhookError,
};
use crate::clients::{DomainClient, EventLogClient, LedgerClient, SubscriptionClient, TenantClient};
use crate::ledger_actor::LedgerError;
use crate::model::{
    slugify, DnsInstructions, Domain, DomainId, Tenant, TenantCreate, TenantId, TenantStatus,
    TenantUpdate, Transaction, VerificationResult,
};
use crate::provisioning::{ProvisioningError, ProvisioningWorkflow};
use crate::providers::Providers;
use crate::tenant_actor::TenantError;
use crate::verification::{fqdn, DomainWorkflow, DomainWorkflowError};
use actor_framework::ActorClient;
use chrono::Utc;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Tenant(#[from] TenantError),

    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),

    #[error(transparent)]
    Domain(#[from] DomainWorkflowError),

    #[error(transparent)]
    Webhook(#[from] WebhookError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Shutdown failed: {0}")]
    Shutdown(String),
}

/// The tenant lifecycle core: the store actors, the three orchestrators on top of
/// them, and the operations the outer application calls.
///
/// # Example
///
/// ```rust
/// use aurelio_lifecycle::lifecycle::{config::ConfigBuilder, Platform};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ConfigBuilder::new().with_auto_provision(false).build()?;
///     let platform = Platform::new(config);
///
///     let tenant = platform.create_tenant("My Shop", "user_1").await?;
///     assert_eq!(tenant.subdomain, "my-shop.aurelio.app");
///
///     platform.shutdown().await?;
///     Ok(())
/// }
/// ```
pub struct Platform {
    tenants: TenantClient,
    domains: DomainClient,
    subscriptions: SubscriptionClient,
    ledger: LedgerClient,
    provisioning: ProvisioningWorkflow,
    verification: DomainWorkflow,
    billing: BillingReconciler,
    config: Arc<PlatformConfig>,

    /// Actor tasks, awaited on shutdown.
    handles: Vec<JoinHandle<()>>,
    /// Provisioning runs started by `create_tenant`.
    background: Mutex<JoinSet<()>>,
    sweep: Option<JoinHandle<()>>,
}

impl Platform {
    /// Starts the platform with the adapters selected by the configuration.
    pub fn new(config: PlatformConfig) -> Self {
        let providers = Providers::from_config(&config);
        Self::with_providers(config, providers)
    }

    /// Starts every store actor and wires the orchestrators to them.
    pub fn with_providers(config: PlatformConfig, providers: Providers) -> Self {
        let config = Arc::new(config);

        let (tenant_actor, tenant_client) = crate::tenant_actor::new();
        let (domain_actor, domain_client) = crate::domain_actor::new();
        let (subscription_actor, subscription_client) = crate::subscription_actor::new();
        let (ledger_actor, ledger_client) = crate::ledger_actor::new();
        let (event_log_actor, event_log_client) = crate::event_log_actor::new();

        let handles = vec![
            tokio::spawn(tenant_actor.run(())),
            tokio::spawn(domain_actor.run(())),
            tokio::spawn(subscription_actor.run(())),
            tokio::spawn(ledger_actor.run(())),
            tokio::spawn(event_log_actor.run(())),
        ];

        let tenants = TenantClient::new(tenant_client);
        let domains = DomainClient::new(domain_client);
        let subscriptions = SubscriptionClient::new(subscription_client);
        let ledger = LedgerClient::new(ledger_client);
        let events = EventLogClient::new(event_log_client);

        let provisioning = ProvisioningWorkflow::new(
            tenants.clone(),
            subscriptions.clone(),
            providers.clone(),
            config.clone(),
        );
        let verification = DomainWorkflow::new(
            domains.clone(),
            tenants.clone(),
            providers.clone(),
            config.clone(),
        );
        let billing = BillingReconciler::new(
            tenants.clone(),
            subscriptions.clone(),
            ledger.clone(),
            events,
            providers,
            config.clone(),
        );

        info!(platform_domain = %config.platform_domain, "Platform started");
        Self {
            tenants,
            domains,
            subscriptions,
            ledger,
            provisioning,
            verification,
            billing,
            config,
            handles,
            background: Mutex::new(JoinSet::new()),
            sweep: None,
        }
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn tenants(&self) -> &TenantClient {
        &self.tenants
    }

    pub fn subscriptions(&self) -> &SubscriptionClient {
        &self.subscriptions
    }

    /// Starts the periodic re-check of unverified domains. Calling it again is a no-op.
    pub fn start_verification_sweep(&mut self) {
        if self.sweep.is_none() {
            self.sweep = Some(spawn_verification_sweep(
                self.verification.clone(),
                self.config.verification_interval,
            ));
        }
    }

    // =========================================================================
    // Tenants
    // =========================================================================

    /// Registers a new tenant owned by `owner_id`. The slug is derived from the name and
    /// must be unused, including by deleted tenants.
    #[instrument(skip(self))]
    pub async fn create_tenant(&self, name: &str, owner_id: &str) -> Result<Tenant, PlatformError> {
        let slug = slugify(name);
        if name.trim().is_empty() || slug.is_empty() {
            return Err(PlatformError::Validation(
                "tenant name must contain at least one letter or digit".into(),
            ));
        }
        if owner_id.trim().is_empty() {
            return Err(PlatformError::Validation("owner id must not be empty".into()));
        }

        let params = TenantCreate {
            name: name.trim().to_string(),
            subdomain: self.config.subdomain_for(&slug),
            slug,
            owner_id: owner_id.trim().to_string(),
            created_at: Utc::now(),
        };
        let tenant = self.tenants.create_tenant(params).await.map_err(|e| match e {
            TenantError::Invalid(msg) => PlatformError::Validation(msg),
            other => other.into(),
        })?;
        info!(tenant_id = %tenant.id, slug = %tenant.slug, "Tenant created");

        if self.config.auto_provision {
            self.spawn_provisioning(tenant.id);
        }
        Ok(tenant)
    }

    /// Runs provisioning on its own task, so dropping the caller's future cannot stop
    /// a step halfway through.
    fn spawn_provisioning(&self, tenant_id: TenantId) {
        let workflow = self.provisioning.clone();
        let mut background = self
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // reap finished runs so the set only holds live ones
        while let Some(result) = background.try_join_next() {
            if let Err(e) = result {
                warn!(error = %e, "Background provisioning task panicked");
            }
        }
        background.spawn(async move {
            match workflow.provision(tenant_id).await {
                Ok(_) => debug!(%tenant_id, "Background provisioning finished"),
                Err(e) => warn!(%tenant_id, error = %e, "Background provisioning failed"),
            }
        });
    }

    pub async fn provision_tenant(&self, tenant_id: TenantId) -> Result<Tenant, PlatformError> {
        Ok(self.provisioning.provision(tenant_id).await?)
    }

    pub async fn cleanup_tenant(&self, tenant_id: TenantId) -> Result<Tenant, PlatformError> {
        Ok(self.provisioning.cleanup(tenant_id).await?)
    }

    pub async fn get_tenant(&self, tenant_id: TenantId) -> Result<Option<Tenant>, PlatformError> {
        Ok(self.tenants.get(tenant_id).await?)
    }

    /// Every tenant, deleted ones included, in creation order.
    pub async fn list_tenants(&self) -> Result<Vec<Tenant>, PlatformError> {
        let mut tenants = self.tenants.list().await?;
        tenants.sort_by_key(|t| t.id);
        Ok(tenants)
    }

    /// Renames the tenant and merges settings; `null` settings values remove the key.
    pub async fn update_tenant(
        &self,
        tenant_id: TenantId,
        update: TenantUpdate,
    ) -> Result<Tenant, PlatformError> {
        Ok(self.tenants.update_tenant(tenant_id, update).await?)
    }

    /// Marks the tenant deleted. External resources stay until
    /// [`Platform::cleanup_tenant`] releases them.
    #[instrument(skip(self))]
    pub async fn soft_delete_tenant(&self, tenant_id: TenantId) -> Result<Tenant, PlatformError> {
        let tenant = self.tenants.soft_delete(tenant_id).await?;
        info!(%tenant_id, "Tenant deleted");
        Ok(tenant)
    }

    /// Maps a request host to the active tenant it serves: the tenant's platform
    /// subdomain, or a verified custom domain with or without `www.`.
    #[instrument(skip(self))]
    pub async fn resolve_host(&self, host: &str) -> Result<Option<Tenant>, PlatformError> {
        let host = host.trim();
        let host = host.split(':').next().unwrap_or(host);
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        if host.is_empty() {
            return Ok(None);
        }

        let suffix = format!(".{}", self.config.platform_domain);
        let tenant = if let Some(slug) = host.strip_suffix(&suffix) {
            if slug.is_empty() || slug.contains('.') {
                None
            } else {
                self.tenants.find_by_slug(slug).await?
            }
        } else if fqdn::is_within(&host, &self.config.platform_domain) {
            None
        } else {
            let mut domain = self
                .domains
                .find_by_name(&host)
                .await
                .map_err(DomainWorkflowError::from)?;
            if domain.is_none() {
                if let Some(apex) = host.strip_prefix("www.") {
                    domain = self
                        .domains
                        .find_by_name(apex)
                        .await
                        .map_err(DomainWorkflowError::from)?;
                }
            }
            match domain {
                Some(domain) if domain.verified() => self.tenants.get(domain.tenant_id).await?,
                _ => None,
            }
        };

        Ok(tenant.filter(|t| t.status == TenantStatus::Active))
    }

    // =========================================================================
    // Domains
    // =========================================================================

    pub async fn add_domain(
        &self,
        tenant_id: TenantId,
        name: &str,
    ) -> Result<(Domain, DnsInstructions), PlatformError> {
        Ok(self.verification.add_domain(tenant_id, name).await?)
    }

    pub async fn verify_domain(
        &self,
        domain_id: DomainId,
    ) -> Result<VerificationResult, PlatformError> {
        Ok(self.verification.verify_domain(domain_id).await?)
    }

    pub async fn remove_domain(&self, domain_id: DomainId) -> Result<(), PlatformError> {
        Ok(self.verification.remove_domain(domain_id).await?)
    }

    pub async fn list_domains(&self, tenant_id: TenantId) -> Result<Vec<Domain>, PlatformError> {
        Ok(self.verification.list_domains(tenant_id).await?)
    }

    /// One pass of the scheduled sweep, on demand.
    pub async fn verify_pending_domains(&self) -> Result<Vec<VerificationResult>, PlatformError> {
        Ok(self.verification.verify_pending().await?)
    }

    // =========================================================================
    // Billing
    // =========================================================================

    /// Entry point for the billing webhook. The signature is checked against the raw
    /// payload before it is decoded.
    #[instrument(skip(self, payload, signature), fields(bytes = payload.len()))]
    pub async fn ingest_billing_event(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<Outcome, PlatformError> {
        let secret = self
            .config
            .billing
            .webhook_secret
            .as_deref()
            .ok_or(WebhookError::MissingSecret)?;
        let header = signature.ok_or(WebhookError::InvalidSignature)?;

        if let Err(e) = verify_signature(
            payload,
            header,
            secret,
            self.config.billing.signature_tolerance,
            Utc::now(),
        ) {
            warn!(error = %e, "Webhook rejected");
            return Err(e.into());
        }

        let event = BillingEvent::decode(payload)?;
        Ok(self.billing.apply(&event).await?)
    }

    /// The tenant's ledger, oldest entry first.
    pub async fn list_transactions(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<Transaction>, PlatformError> {
        Ok(self.ledger.list_for_tenant(tenant_id).await?)
    }

    /// Stops the sweep, waits for background provisioning runs, then closes every actor
    /// by dropping the last clients and waits for the actor tasks to finish.
    pub async fn shutdown(self) -> Result<(), PlatformError> {
        info!("Shutting down platform...");
        let Platform {
            tenants,
            domains,
            subscriptions,
            ledger,
            provisioning,
            verification,
            billing,
            handles,
            background,
            sweep,
            ..
        } = self;

        if let Some(sweep) = sweep {
            sweep.abort();
            // cancelled on purpose, so the JoinError carries no information
            let _ = sweep.await;
        }

        let mut background = background.into_inner().unwrap_or_else(PoisonError::into_inner);
        while let Some(result) = background.join_next().await {
            if let Err(e) = result {
                error!("Provisioning task failed: {:?}", e);
            }
        }

        drop(provisioning);
        drop(verification);
        drop(billing);
        drop(tenants);
        drop(domains);
        drop(subscriptions);
        drop(ledger);

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(PlatformError::Shutdown(format!("Actor task failed: {e:?}")));
            }
        }

        info!("Platform shutdown complete.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::ConfigBuilder;
    use crate::providers::dns::StaticResolver;
    use crate::providers::sandbox::{
        RecordingNotifier, SandboxDatabases, SandboxDeployment, SandboxMessaging, SandboxRegistry,
    };
    use std::time::Duration;

    fn platform() -> Platform {
        let providers = Providers {
            databases: Arc::new(SandboxDatabases::new()),
            deployments: Arc::new(SandboxDeployment::new()),
            domains: Some(Arc::new(SandboxRegistry::new())),
            resolver: Arc::new(StaticResolver::new()),
            messaging: Arc::new(SandboxMessaging::new()),
            notifier: Arc::new(RecordingNotifier::new()),
        };
        let config = ConfigBuilder::new()
            .with_auto_provision(true)
            .with_provider_timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        Platform::with_providers(config, providers)
    }

    fn background_len(platform: &Platform) -> usize {
        platform
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[tokio::test]
    async fn finished_provisioning_runs_are_reaped() {
        let platform = platform();
        let first = platform.create_tenant("First Shop", "user_1").await.unwrap();
        for _ in 0..50 {
            let tenant = platform.get_tenant(first.id).await.unwrap().unwrap();
            if tenant.status == TenantStatus::Active {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        // let the finished run's task wind down
        tokio::time::sleep(Duration::from_millis(50)).await;

        platform.create_tenant("Second Shop", "user_1").await.unwrap();
        assert_eq!(background_len(&platform), 1);

        platform.shutdown().await.unwrap();
    }
}
