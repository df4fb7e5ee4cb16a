use super::error::DomainWorkflowError;
use super::fqdn;
use super::instructions::dns_instructions;
use crate::clients::{DomainClient, TenantClient};
use crate::domain_actor::DomainError;
use crate::lifecycle::config::PlatformConfig;
use crate::model::{
    DnsInstructions, Domain, DomainCreate, DomainId, TenantId, TenantStatus, VerificationResult,
};
use crate::providers::{with_timeout, DomainStatusReport, Providers};
use actor_framework::ActorClient;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Custom domain lifecycle: `pending → pending_verification → verified → ssl_enabled`.
///
/// The local record is always written first; provider registration is best-effort and
/// retried by later verification attempts.
#[derive(Clone)]
pub struct DomainWorkflow {
    domains: DomainClient,
    tenants: TenantClient,
    providers: Providers,
    config: Arc<PlatformConfig>,
}

impl DomainWorkflow {
    pub fn new(
        domains: DomainClient,
        tenants: TenantClient,
        providers: Providers,
        config: Arc<PlatformConfig>,
    ) -> Self {
        Self {
            domains,
            tenants,
            providers,
            config,
        }
    }

    async fn load(&self, domain_id: DomainId) -> Result<Domain, DomainWorkflowError> {
        self.domains
            .get(domain_id)
            .await?
            .ok_or(DomainWorkflowError::DomainNotFound(domain_id))
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn add_domain(
        &self,
        tenant_id: TenantId,
        name: &str,
    ) -> Result<(Domain, DnsInstructions), DomainWorkflowError> {
        let name = fqdn::normalize(name).map_err(DomainWorkflowError::InvalidDomain)?;
        if fqdn::is_within(&name, &self.config.platform_domain) {
            return Err(DomainWorkflowError::InvalidDomain(format!(
                "{name} is part of the platform domain"
            )));
        }

        let tenant = self
            .tenants
            .get(tenant_id)
            .await?
            .ok_or(DomainWorkflowError::TenantNotFound(tenant_id))?;
        if tenant.status == TenantStatus::Deleted {
            return Err(DomainWorkflowError::TenantDeleted(tenant_id));
        }

        let mut domain = self
            .domains
            .create_domain(DomainCreate {
                tenant_id,
                name,
                created_at: Utc::now(),
            })
            .await
            .map_err(|e| match e {
                DomainError::DomainTaken(name) => DomainWorkflowError::DomainTaken(name),
                other => other.into(),
            })?;
        info!(domain_id = %domain.id, name = %domain.name, "Domain added");

        if let Some(registered) = self.try_register(&domain).await? {
            domain = registered;
        }

        Ok((domain, dns_instructions(&self.config.dns)))
    }

    /// Registers the domain with the provider, if one is configured. Provider failures
    /// are logged and leave the domain as it was.
    async fn try_register(&self, domain: &Domain) -> Result<Option<Domain>, DomainWorkflowError> {
        let Some(registry) = &self.providers.domains else {
            return Ok(None);
        };
        match with_timeout(
            "domains",
            self.config.provider_timeout,
            registry.register_domain(&domain.name),
        )
        .await
        {
            Ok(handle) => {
                let domain = self.domains.record_registration(domain.id, handle).await?;
                info!(domain_id = %domain.id, "Domain registered with provider");
                Ok(Some(domain))
            }
            Err(e) => {
                warn!(
                    domain_id = %domain.id,
                    error = %e,
                    "Domain registration failed, will retry on verification"
                );
                Ok(None)
            }
        }
    }

    /// Checks whether the domain points at the platform. Not being there yet is a normal
    /// answer (`verified == false`), never an error.
    #[instrument(skip(self), fields(domain_id = %domain_id))]
    pub async fn verify_domain(
        &self,
        domain_id: DomainId,
    ) -> Result<VerificationResult, DomainWorkflowError> {
        let mut domain = self.load(domain_id).await?;

        if domain.ssl_enabled() {
            return Ok(unchecked(domain));
        }

        if domain.verified() {
            // only TLS can still change; without a registration there is nobody to ask
            if domain.registration.is_none() || self.providers.domains.is_none() {
                return Ok(unchecked(domain));
            }
        } else if domain.registration.is_none() {
            if let Some(registered) = self.try_register(&domain).await? {
                domain = registered;
            }
        }

        let report = self.check(&domain).await;
        debug!(verified = report.verified, tls = report.tls_enabled, "Check complete");

        let domain = self
            .domains
            .apply_check(domain.id, report.verified, report.tls_enabled, Utc::now())
            .await?;
        if domain.verified() {
            info!(status = %domain.status, "Domain verified");
        }
        Ok(VerificationResult {
            verified: domain.verified(),
            ssl_enabled: domain.ssl_enabled(),
            domain,
            checked: true,
        })
    }

    async fn check(&self, domain: &Domain) -> DomainStatusReport {
        let timeout = self.config.provider_timeout;
        match (&domain.registration, &self.providers.domains) {
            (Some(_), Some(registry)) => {
                match with_timeout("domains", timeout, registry.domain_status(&domain.name)).await
                {
                    Ok(report) => report,
                    Err(e) => {
                        info!(error = %e, "Domain status unavailable, treating as not verified");
                        DomainStatusReport::default()
                    }
                }
            }
            _ => {
                let resolved = with_timeout(
                    "dns",
                    timeout,
                    self.providers.resolver.resolve_ipv4(&domain.name),
                )
                .await;
                match resolved {
                    Ok(addrs) => DomainStatusReport {
                        verified: addrs.contains(&self.config.dns.apex_target),
                        tls_enabled: false,
                    },
                    Err(e) => {
                        info!(error = %e, "DNS lookup failed, treating as not verified");
                        DomainStatusReport::default()
                    }
                }
            }
        }
    }

    #[instrument(skip(self), fields(domain_id = %domain_id))]
    pub async fn remove_domain(&self, domain_id: DomainId) -> Result<(), DomainWorkflowError> {
        let domain = self.load(domain_id).await?;
        if let (Some(handle), Some(registry)) = (&domain.registration, &self.providers.domains) {
            if let Err(e) = with_timeout(
                "domains",
                self.config.provider_timeout,
                registry.deregister_domain(&domain.name, handle),
            )
            .await
            {
                warn!(error = %e, "Provider deregistration failed, removing local record anyway");
            }
        }
        self.domains.delete(domain_id).await?;
        info!(name = %domain.name, "Domain removed");
        Ok(())
    }

    /// The tenant's domains, newest first.
    pub async fn list_domains(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<Domain>, DomainWorkflowError> {
        Ok(self.domains.list_for_tenant(tenant_id).await?)
    }

    /// Re-checks every domain that is not fully enabled yet. Failures of individual
    /// checks are logged and skipped.
    #[instrument(skip(self))]
    pub async fn verify_pending(&self) -> Result<Vec<VerificationResult>, DomainWorkflowError> {
        let pending: Vec<Domain> = self
            .domains
            .list()
            .await?
            .into_iter()
            .filter(|d| !d.ssl_enabled())
            .collect();
        debug!(count = pending.len(), "Sweeping unverified domains");

        let mut results = Vec::with_capacity(pending.len());
        for domain in pending {
            match self.verify_domain(domain.id).await {
                Ok(result) => results.push(result),
                // removed while the sweep was running
                Err(DomainWorkflowError::DomainNotFound(_)) => {}
                Err(e) => warn!(domain_id = %domain.id, error = %e, "Verification failed"),
            }
        }
        Ok(results)
    }
}

fn unchecked(domain: Domain) -> VerificationResult {
    VerificationResult {
        verified: domain.verified(),
        ssl_enabled: domain.ssl_enabled(),
        domain,
        checked: false,
    }
}
