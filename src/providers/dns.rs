use super::{DnsResolver, ProviderError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Mutex;

/// Resolves through the operating system resolver.
pub struct SystemResolver;

#[async_trait]
impl DnsResolver for SystemResolver {
    async fn resolve_ipv4(&self, host: &str) -> Result<Vec<Ipv4Addr>, ProviderError> {
        let addrs = tokio::net::lookup_host((host, 443))
            .await
            .map_err(|e| ProviderError::Transient {
                provider: "dns",
                message: e.to_string(),
            })?;
        Ok(addrs
            .filter_map(|addr| match addr.ip() {
                IpAddr::V4(ip) => Some(ip),
                IpAddr::V6(_) => None,
            })
            .collect())
    }
}

/// Fixed answers, for local runs and tests. Unknown hosts resolve to nothing.
#[derive(Default)]
pub struct StaticResolver {
    records: Mutex<HashMap<String, Vec<Ipv4Addr>>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, host: &str, addrs: Vec<Ipv4Addr>) {
        if let Ok(mut records) = self.records.lock() {
            records.insert(host.to_string(), addrs);
        }
    }
}

#[async_trait]
impl DnsResolver for StaticResolver {
    async fn resolve_ipv4(&self, host: &str) -> Result<Vec<Ipv4Addr>, ProviderError> {
        let records = self.records.lock().map_err(|_| ProviderError::Transient {
            provider: "dns",
            message: "resolver state poisoned".into(),
        })?;
        Ok(records.get(host).cloned().unwrap_or_default())
    }
}
