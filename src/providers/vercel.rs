//! Custom-domain registration through the Vercel project domains API.

use super::{DomainRegistry, DomainStatusReport, ProviderError};
use crate::lifecycle::config::VercelConfig;
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

const PROVIDER: &str = "vercel";

#[derive(Deserialize)]
struct AddDomainResponse {
    name: String,
    #[serde(default)]
    uid: Option<String>,
}

#[derive(Deserialize)]
struct DomainResponse {
    #[serde(default)]
    verified: bool,
    #[serde(default, rename = "sslEnabled")]
    ssl_enabled: bool,
}

pub struct VercelRegistry {
    http: reqwest::Client,
    config: VercelConfig,
}

impl VercelRegistry {
    pub fn new(config: VercelConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn domains_url(&self, suffix: &str) -> String {
        format!(
            "{}/v9/projects/{}/domains{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.project_id,
            suffix
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.bearer_auth(&self.config.token);
        match &self.config.team_id {
            Some(team) => request.query(&[("teamId", team)]),
            None => request,
        }
    }
}

#[async_trait]
impl DomainRegistry for VercelRegistry {
    #[instrument(skip(self))]
    async fn register_domain(&self, name: &str) -> Result<String, ProviderError> {
        let response: AddDomainResponse = self
            .authorize(self.http.post(self.domains_url("")))
            .json(&json!({ "name": name }))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ProviderError::from_http(PROVIDER, e))?
            .json()
            .await
            .map_err(|e| ProviderError::from_http(PROVIDER, e))?;
        Ok(response.uid.unwrap_or(response.name))
    }

    #[instrument(skip(self))]
    async fn domain_status(&self, name: &str) -> Result<DomainStatusReport, ProviderError> {
        let response: DomainResponse = self
            .authorize(self.http.get(self.domains_url(&format!("/{name}"))))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ProviderError::from_http(PROVIDER, e))?
            .json()
            .await
            .map_err(|e| ProviderError::from_http(PROVIDER, e))?;
        debug!(verified = response.verified, tls = response.ssl_enabled, "Domain status");
        Ok(DomainStatusReport {
            verified: response.verified,
            tls_enabled: response.verified && response.ssl_enabled,
        })
    }

    #[instrument(skip(self))]
    async fn deregister_domain(&self, name: &str, _handle: &str) -> Result<(), ProviderError> {
        let response = self
            .authorize(self.http.delete(self.domains_url(&format!("/{name}"))))
            .send()
            .await
            .map_err(|e| ProviderError::from_http(PROVIDER, e))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        response
            .error_for_status()
            .map(|_| ())
            .map_err(|e| ProviderError::from_http(PROVIDER, e))
    }
}
