use super::{DeploymentService, ProviderError};
use crate::model::{BackendEndpoints, TenantId};
use async_trait::async_trait;
use tracing::info;

/// Deployment target whose per-tenant URL follows a fixed pattern, e.g.
/// `https://medusa-{tenant}.railway.app`. The backend itself is rolled out by the
/// hosting platform; this adapter only derives where it will live.
pub struct TemplateDeployment {
    url_template: String,
}

impl TemplateDeployment {
    pub fn new(url_template: String) -> Self {
        Self { url_template }
    }

    pub fn endpoints_for(&self, tenant_id: TenantId) -> BackendEndpoints {
        let base = self
            .url_template
            .replace("{tenant}", &tenant_id.to_string())
            .trim_end_matches('/')
            .to_string();
        BackendEndpoints {
            api_url: format!("{base}/store"),
            admin_url: format!("{base}/app"),
        }
    }
}

#[async_trait]
impl DeploymentService for TemplateDeployment {
    async fn deploy(
        &self,
        tenant_id: TenantId,
        connection_uri: &str,
    ) -> Result<BackendEndpoints, ProviderError> {
        if connection_uri.is_empty() {
            return Err(ProviderError::Rejected {
                provider: "deployment",
                message: "backend needs a database connection".into(),
            });
        }
        let endpoints = self.endpoints_for(tenant_id);
        info!(%tenant_id, api_url = %endpoints.api_url, "Backend deployment requested");
        Ok(endpoints)
    }

    async fn teardown(&self, tenant_id: TenantId) -> Result<(), ProviderError> {
        info!(%tenant_id, "Backend teardown requested");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_follow_template() {
        let deployment = TemplateDeployment::new("https://medusa-{tenant}.railway.app".into());
        let endpoints = deployment.endpoints_for(TenantId(7));
        assert_eq!(endpoints.api_url, "https://medusa-tenant_7.railway.app/store");
        assert_eq!(endpoints.admin_url, "https://medusa-tenant_7.railway.app/app");
    }
}
