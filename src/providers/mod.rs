//! # External Provider Adapters
//!
//! Narrow interfaces over the third-party services the lifecycle depends on. Workflows
//! only see these traits; concrete adapters are chosen once in
//! [`Providers::from_config`].
//!
//! | Trait | Production adapter | Fallback / test adapter |
//! |---|---|---|
//! | [`DatabaseProvisioner`] | [`neon::NeonProvisioner`] | [`sandbox::SandboxDatabases`] |
//! | [`DeploymentService`] | [`deployment::TemplateDeployment`] | [`sandbox::SandboxDeployment`] |
//! | [`DomainRegistry`] | [`vercel::VercelRegistry`] | [`sandbox::SandboxRegistry`] |
//! | [`DnsResolver`] | [`dns::SystemResolver`] | [`dns::StaticResolver`] |
//! | [`MessagingProvisioner`] | [`sandbox::SandboxMessaging`] | same |
//! | [`BillingNotifier`] | [`notify::LogNotifier`] | [`sandbox::RecordingNotifier`] |
//!
//! Every call made by a workflow goes through [`with_timeout`], so a hung provider
//! surfaces as [`ProviderError::Timeout`] instead of stalling the step sequence.

pub mod deployment;
pub mod dns;
pub mod neon;
pub mod notify;
pub mod sandbox;
pub mod vercel;

use crate::lifecycle::config::PlatformConfig;
use crate::model::{BackendEndpoints, DatabaseHandle, TenantId};
use async_trait::async_trait;
use std::future::Future;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Normalized failure of an external call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("{provider} timed out after {after:?}")]
    Timeout {
        provider: &'static str,
        after: Duration,
    },

    /// Network failure or 5xx; the same call may succeed later.
    #[error("{provider} unavailable: {message}")]
    Transient {
        provider: &'static str,
        message: String,
    },

    /// 4xx or an explicit refusal; retrying the same call will not help.
    #[error("{provider} rejected the request: {message}")]
    Rejected {
        provider: &'static str,
        message: String,
    },
}

impl ProviderError {
    pub fn is_transient(&self) -> bool {
        !matches!(self, ProviderError::Rejected { .. })
    }

    /// Classifies a failed HTTP exchange.
    pub(crate) fn from_http(provider: &'static str, err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) if status.is_client_error() => ProviderError::Rejected {
                provider,
                message: err.to_string(),
            },
            _ => ProviderError::Transient {
                provider,
                message: err.to_string(),
            },
        }
    }
}

/// Bounds a provider call by `after`.
pub async fn with_timeout<T, F>(
    provider: &'static str,
    after: Duration,
    call: F,
) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(after, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout { provider, after }),
    }
}

/// Allocates and releases per-tenant databases.
#[async_trait]
pub trait DatabaseProvisioner: Send + Sync {
    async fn create_database(&self, name: &str) -> Result<DatabaseHandle, ProviderError>;
    async fn delete_database(&self, handle: &DatabaseHandle) -> Result<(), ProviderError>;
}

/// Deploys the commerce backend for a tenant.
#[async_trait]
pub trait DeploymentService: Send + Sync {
    async fn deploy(
        &self,
        tenant_id: TenantId,
        connection_uri: &str,
    ) -> Result<BackendEndpoints, ProviderError>;

    async fn teardown(&self, tenant_id: TenantId) -> Result<(), ProviderError>;
}

/// What the DNS provider currently knows about a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DomainStatusReport {
    pub verified: bool,
    pub tls_enabled: bool,
}

/// Registers custom domains with the DNS/edge provider that terminates TLS.
#[async_trait]
pub trait DomainRegistry: Send + Sync {
    /// Returns the provider's handle for the domain.
    async fn register_domain(&self, name: &str) -> Result<String, ProviderError>;
    async fn domain_status(&self, name: &str) -> Result<DomainStatusReport, ProviderError>;
    async fn deregister_domain(&self, name: &str, handle: &str) -> Result<(), ProviderError>;
}

/// Direct DNS lookups, used when a domain has no provider registration.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    async fn resolve_ipv4(&self, host: &str) -> Result<Vec<Ipv4Addr>, ProviderError>;
}

/// Optional per-tenant messaging integrations.
#[async_trait]
pub trait MessagingProvisioner: Send + Sync {
    /// Creates the tenant's mailing list; returns its handle.
    async fn enable_email(&self, tenant_id: TenantId, slug: &str) -> Result<String, ProviderError>;
    /// Allocates the tenant's sms sender; returns its handle.
    async fn enable_sms(&self, tenant_id: TenantId, slug: &str) -> Result<String, ProviderError>;
}

/// Details of a failed invoice payment, handed to whoever informs the tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentFailure {
    pub tenant_id: TenantId,
    pub invoice_id: String,
    pub amount_due_cents: i64,
    pub currency: String,
    pub attempt_count: u32,
}

#[async_trait]
pub trait BillingNotifier: Send + Sync {
    async fn payment_failed(&self, failure: &PaymentFailure) -> Result<(), ProviderError>;
}

/// The set of adapters the workflows run against.
#[derive(Clone)]
pub struct Providers {
    pub databases: Arc<dyn DatabaseProvisioner>,
    pub deployments: Arc<dyn DeploymentService>,
    /// `None` leaves domain verification to direct DNS resolution.
    pub domains: Option<Arc<dyn DomainRegistry>>,
    pub resolver: Arc<dyn DnsResolver>,
    pub messaging: Arc<dyn MessagingProvisioner>,
    pub notifier: Arc<dyn BillingNotifier>,
}

impl Providers {
    /// Picks real adapters where credentials are configured and local fallbacks
    /// everywhere else.
    pub fn from_config(config: &PlatformConfig) -> Self {
        let databases: Arc<dyn DatabaseProvisioner> = match &config.neon {
            Some(neon) => Arc::new(neon::NeonProvisioner::new(
                neon.clone(),
                config.database.region.clone(),
            )),
            None => {
                info!("No database provider credentials, using sandbox databases");
                Arc::new(sandbox::SandboxDatabases::new())
            }
        };

        let domains: Option<Arc<dyn DomainRegistry>> = match &config.vercel {
            Some(vercel) => Some(Arc::new(vercel::VercelRegistry::new(vercel.clone()))),
            None => {
                info!("No domain provider credentials, verifying custom domains via DNS");
                None
            }
        };

        Self {
            databases,
            deployments: Arc::new(deployment::TemplateDeployment::new(
                config.deployment.url_template.clone(),
            )),
            domains,
            resolver: Arc::new(dns::SystemResolver),
            messaging: Arc::new(sandbox::SandboxMessaging::new()),
            notifier: Arc::new(notify::LogNotifier),
        }
    }
}
