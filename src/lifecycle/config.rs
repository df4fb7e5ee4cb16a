//! Platform configuration, assembled once at start-up and shared as `Arc<PlatformConfig>`.
//!
//! ```rust
//! use aurelio_lifecycle::lifecycle::config::ConfigBuilder;
//!
//! let config = ConfigBuilder::new()
//!     .with_platform_domain("shops.example")
//!     .with_auto_provision(false)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.subdomain_for("my-shop"), "my-shop.shops.example");
//! ```

use serde::Deserialize;
use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;
use thiserror::Error;

const ENV_PREFIX: &str = "AURELIO_";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        message: message.into(),
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Parent domain of every tenant subdomain.
    pub platform_domain: String,
    pub provider_timeout: Duration,
    /// How long a provisioning claim stays valid without completing.
    pub provisioning_lease: Duration,
    /// Age after which an unfinished billing event claim may be taken over.
    pub event_claim_ttl: Duration,
    pub verification_interval: Duration,
    /// Start provisioning in the background as soon as a tenant is created.
    pub auto_provision: bool,
    pub default_plan: String,
    pub dns: DnsConfig,
    pub deployment: DeploymentConfig,
    pub database: DatabaseConfig,
    pub neon: Option<NeonConfig>,
    pub vercel: Option<VercelConfig>,
    pub billing: BillingConfig,
    pub logging: LoggingConfig,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            platform_domain: "aurelio.app".to_string(),
            provider_timeout: Duration::from_secs(30),
            provisioning_lease: Duration::from_secs(300),
            event_claim_ttl: Duration::from_secs(120),
            verification_interval: Duration::from_secs(300),
            auto_provision: true,
            default_plan: "standard".to_string(),
            dns: DnsConfig::default(),
            deployment: DeploymentConfig::default(),
            database: DatabaseConfig::default(),
            neon: None,
            vercel: None,
            billing: BillingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl PlatformConfig {
    pub fn subdomain_for(&self, slug: &str) -> String {
        format!("{slug}.{}", self.platform_domain)
    }

    pub fn provisioning_lease_span(&self) -> chrono::Duration {
        to_span(self.provisioning_lease)
    }

    pub fn event_claim_ttl_span(&self) -> chrono::Duration {
        to_span(self.event_claim_ttl)
    }
}

fn to_span(d: Duration) -> chrono::Duration {
    chrono::Duration::milliseconds(i64::try_from(d.as_millis()).unwrap_or(i64::MAX / 1_000))
}

/// Records customers are told to create for a custom domain.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DnsConfig {
    pub apex_target: Ipv4Addr,
    pub cname_target: String,
    pub ttl: u32,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            apex_target: Ipv4Addr::new(76, 76, 21, 21),
            cname_target: "cname.vercel-dns.com".to_string(),
            ttl: 3600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// `{tenant}` is replaced with the tenant id.
    pub url_template: String,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            url_template: "https://medusa-{tenant}.railway.app".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub region: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            region: "aws-us-east-2".to_string(),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct NeonConfig {
    pub api_key: String,
    #[serde(default = "default_neon_url")]
    pub base_url: String,
}

fn default_neon_url() -> String {
    "https://console.neon.tech/api/v2".to_string()
}

impl fmt::Debug for NeonConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NeonConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Clone, Deserialize)]
pub struct VercelConfig {
    pub token: String,
    pub project_id: String,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default = "default_vercel_url")]
    pub base_url: String,
}

fn default_vercel_url() -> String {
    "https://api.vercel.com".to_string()
}

impl fmt::Debug for VercelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VercelConfig")
            .field("token", &"[REDACTED]")
            .field("project_id", &self.project_id)
            .field("team_id", &self.team_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    pub webhook_secret: Option<String>,
    /// Maximum age of a signed webhook timestamp.
    pub signature_tolerance: Duration,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            webhook_secret: None,
            signature_tolerance: Duration::from_secs(300),
        }
    }
}

impl fmt::Debug for BillingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BillingConfig")
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("signature_tolerance", &self.signature_tolerance)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn prefixed(name: &str) -> Option<String> {
    env_var(&format!("{ENV_PREFIX}{name}"))
}

fn parse_secs(field: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| invalid(field, format!("expected whole seconds, got {raw:?}")))
}

fn parse_flag(field: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(field, format!("expected a boolean, got {raw:?}"))),
    }
}

/// Fluent builder over [`PlatformConfig`]; environment values are parsed eagerly and
/// any parse failure is reported by [`ConfigBuilder::build`].
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: PlatformConfig,
    errors: Vec<ConfigError>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: PlatformConfig::default(),
            errors: Vec::new(),
        }
    }

    pub fn with_platform_domain(mut self, domain: impl Into<String>) -> Self {
        self.config.platform_domain = domain.into();
        self
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.config.provider_timeout = timeout;
        self
    }

    pub fn with_provisioning_lease(mut self, lease: Duration) -> Self {
        self.config.provisioning_lease = lease;
        self
    }

    pub fn with_event_claim_ttl(mut self, ttl: Duration) -> Self {
        self.config.event_claim_ttl = ttl;
        self
    }

    pub fn with_verification_interval(mut self, interval: Duration) -> Self {
        self.config.verification_interval = interval;
        self
    }

    pub fn with_auto_provision(mut self, enabled: bool) -> Self {
        self.config.auto_provision = enabled;
        self
    }

    pub fn with_default_plan(mut self, plan: impl Into<String>) -> Self {
        self.config.default_plan = plan.into();
        self
    }

    pub fn with_dns(mut self, dns: DnsConfig) -> Self {
        self.config.dns = dns;
        self
    }

    pub fn with_deployment_template(mut self, template: impl Into<String>) -> Self {
        self.config.deployment.url_template = template.into();
        self
    }

    pub fn with_neon(mut self, neon: NeonConfig) -> Self {
        self.config.neon = Some(neon);
        self
    }

    pub fn with_vercel(mut self, vercel: VercelConfig) -> Self {
        self.config.vercel = Some(vercel);
        self
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.billing.webhook_secret = Some(secret.into());
        self
    }

    pub fn with_signature_tolerance(mut self, tolerance: Duration) -> Self {
        self.config.billing.signature_tolerance = tolerance;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    fn duration_from_env(&mut self, name: &str, field: &'static str) -> Option<Duration> {
        let raw = prefixed(name)?;
        match parse_secs(field, &raw) {
            Ok(d) => Some(d),
            Err(e) => {
                self.errors.push(e);
                None
            }
        }
    }

    /// Load settings from `AURELIO_*` variables and provider credentials from their
    /// conventional variable names.
    pub fn from_env(mut self) -> Self {
        if let Some(domain) = prefixed("PLATFORM_DOMAIN") {
            self.config.platform_domain = domain;
        }
        if let Some(d) = self.duration_from_env("PROVIDER_TIMEOUT_SECS", "provider_timeout") {
            self.config.provider_timeout = d;
        }
        if let Some(d) = self.duration_from_env("PROVISIONING_LEASE_SECS", "provisioning_lease") {
            self.config.provisioning_lease = d;
        }
        if let Some(d) = self.duration_from_env("EVENT_CLAIM_TTL_SECS", "event_claim_ttl") {
            self.config.event_claim_ttl = d;
        }
        if let Some(d) =
            self.duration_from_env("VERIFICATION_INTERVAL_SECS", "verification_interval")
        {
            self.config.verification_interval = d;
        }
        if let Some(d) = self.duration_from_env("SIGNATURE_TOLERANCE_SECS", "signature_tolerance")
        {
            self.config.billing.signature_tolerance = d;
        }
        if let Some(raw) = prefixed("AUTO_PROVISION") {
            match parse_flag("auto_provision", &raw) {
                Ok(flag) => self.config.auto_provision = flag,
                Err(e) => self.errors.push(e),
            }
        }
        if let Some(plan) = prefixed("DEFAULT_PLAN") {
            self.config.default_plan = plan;
        }
        if let Some(raw) = prefixed("DNS_APEX_TARGET") {
            match raw.trim().parse() {
                Ok(ip) => self.config.dns.apex_target = ip,
                Err(_) => self
                    .errors
                    .push(invalid("dns.apex_target", format!("not an IPv4 address: {raw:?}"))),
            }
        }
        if let Some(target) = prefixed("DNS_CNAME_TARGET") {
            self.config.dns.cname_target = target;
        }
        if let Some(template) = prefixed("DEPLOYMENT_URL_TEMPLATE") {
            self.config.deployment.url_template = template;
        }
        if let Some(region) = prefixed("DATABASE_REGION") {
            self.config.database.region = region;
        }
        if let Some(level) = prefixed("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(raw) = prefixed("LOG_JSON") {
            match parse_flag("logging.json", &raw) {
                Ok(flag) => self.config.logging.json = flag,
                Err(e) => self.errors.push(e),
            }
        }

        if let Some(api_key) = env_var("NEON_API_KEY") {
            self.config.neon = Some(NeonConfig {
                api_key,
                base_url: prefixed("NEON_BASE_URL").unwrap_or_else(default_neon_url),
            });
        }
        if let (Some(token), Some(project_id)) =
            (env_var("VERCEL_TOKEN"), env_var("VERCEL_PROJECT_ID"))
        {
            self.config.vercel = Some(VercelConfig {
                token,
                project_id,
                team_id: env_var("VERCEL_TEAM_ID"),
                base_url: prefixed("VERCEL_BASE_URL").unwrap_or_else(default_vercel_url),
            });
        }
        if let Some(secret) = env_var("STRIPE_WEBHOOK_SECRET") {
            self.config.billing.webhook_secret = Some(secret);
        }

        self
    }

    /// Validates and returns the configuration. The first recorded problem wins.
    pub fn build(mut self) -> Result<PlatformConfig, ConfigError> {
        if !self.errors.is_empty() {
            return Err(self.errors.remove(0));
        }
        let config = self.config;

        if config.platform_domain.trim().is_empty() || config.platform_domain.contains('/') {
            return Err(invalid("platform_domain", "must be a bare domain name"));
        }
        for (field, value) in [
            ("provider_timeout", config.provider_timeout),
            ("provisioning_lease", config.provisioning_lease),
            ("event_claim_ttl", config.event_claim_ttl),
            ("verification_interval", config.verification_interval),
        ] {
            if value.is_zero() {
                return Err(invalid(field, "must be greater than zero"));
            }
        }
        if config.provisioning_lease <= config.provider_timeout {
            return Err(invalid(
                "provisioning_lease",
                "must be longer than provider_timeout",
            ));
        }
        if config.default_plan.trim().is_empty() {
            return Err(invalid("default_plan", "must not be empty"));
        }
        if !config.deployment.url_template.contains("{tenant}") {
            return Err(invalid(
                "deployment.url_template",
                "must contain the {tenant} placeholder",
            ));
        }
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(invalid(
                "logging.level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.platform_domain, "aurelio.app");
        assert_eq!(config.dns.apex_target, Ipv4Addr::new(76, 76, 21, 21));
        assert_eq!(config.billing.signature_tolerance, Duration::from_secs(300));
        assert!(config.neon.is_none());
    }

    #[test]
    fn lease_must_outlast_provider_timeout() {
        let err = ConfigBuilder::new()
            .with_provider_timeout(Duration::from_secs(60))
            .with_provisioning_lease(Duration::from_secs(30))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "provisioning_lease", .. }));
    }

    #[test]
    fn template_needs_placeholder() {
        let err = ConfigBuilder::new()
            .with_deployment_template("https://backend.example")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "deployment.url_template", .. }));
    }

    #[test]
    fn secrets_are_redacted() {
        let neon = NeonConfig {
            api_key: "napi_secret".into(),
            base_url: default_neon_url(),
        };
        let config = ConfigBuilder::new()
            .with_neon(neon)
            .with_webhook_secret("whsec_secret")
            .build()
            .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("napi_secret"));
        assert!(!rendered.contains("whsec_secret"));
    }

    #[test]
    fn flags_parse_loosely() {
        assert_eq!(parse_flag("x", "Yes"), Ok(true));
        assert_eq!(parse_flag("x", "0"), Ok(false));
        assert!(parse_flag("x", "maybe").is_err());
    }
}
