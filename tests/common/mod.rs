#![allow(dead_code)]

use aurelio_lifecycle::billing::signature_header;
use aurelio_lifecycle::lifecycle::{ConfigBuilder, Platform};
use aurelio_lifecycle::providers::dns::StaticResolver;
use aurelio_lifecycle::providers::sandbox::{
    RecordingNotifier, SandboxDatabases, SandboxDeployment, SandboxMessaging, SandboxRegistry,
};
use aurelio_lifecycle::providers::{DomainRegistry, Providers};
use std::sync::Arc;
use std::time::Duration;

pub const WEBHOOK_SECRET: &str = "whsec_test";

/// A platform running against sandbox adapters, with handles to steer them.
pub struct Harness {
    pub platform: Platform,
    pub databases: Arc<SandboxDatabases>,
    pub deployments: Arc<SandboxDeployment>,
    pub registry: Arc<SandboxRegistry>,
    pub resolver: Arc<StaticResolver>,
    pub messaging: Arc<SandboxMessaging>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn config() -> ConfigBuilder {
    ConfigBuilder::new()
        .with_auto_provision(false)
        .with_provider_timeout(Duration::from_millis(200))
        .with_provisioning_lease(Duration::from_secs(5))
        .with_webhook_secret(WEBHOOK_SECRET)
}

fn build(builder: ConfigBuilder, with_registry: bool) -> Harness {
    let databases = Arc::new(SandboxDatabases::new());
    let deployments = Arc::new(SandboxDeployment::new());
    let registry = Arc::new(SandboxRegistry::new());
    let resolver = Arc::new(StaticResolver::new());
    let messaging = Arc::new(SandboxMessaging::new());
    let notifier = Arc::new(RecordingNotifier::new());

    let providers = Providers {
        databases: databases.clone(),
        deployments: deployments.clone(),
        domains: with_registry.then(|| registry.clone() as Arc<dyn DomainRegistry>),
        resolver: resolver.clone(),
        messaging: messaging.clone(),
        notifier: notifier.clone(),
    };
    let config = builder.build().expect("test config is valid");

    Harness {
        platform: Platform::with_providers(config, providers),
        databases,
        deployments,
        registry,
        resolver,
        messaging,
        notifier,
    }
}

pub fn harness() -> Harness {
    build(config(), true)
}

pub fn harness_with(builder: ConfigBuilder) -> Harness {
    build(builder, true)
}

/// No domain provider configured: verification falls back to DNS.
pub fn harness_without_registry() -> Harness {
    build(config(), false)
}

/// Signs `event` the way the billing provider does.
pub fn signed(event: &serde_json::Value) -> (Vec<u8>, String) {
    let payload = serde_json::to_vec(event).expect("event serializes");
    let header = signature_header(WEBHOOK_SECRET, chrono::Utc::now().timestamp(), &payload);
    (payload, header)
}
