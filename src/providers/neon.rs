//! Database provisioning through the Neon projects API: one project per tenant.

use super::{DatabaseProvisioner, ProviderError};
use crate::lifecycle::config::NeonConfig;
use crate::model::DatabaseHandle;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const PROVIDER: &str = "neon";

#[derive(Serialize)]
struct CreateProjectRequest<'a> {
    project: ProjectSpec<'a>,
}

#[derive(Serialize)]
struct ProjectSpec<'a> {
    name: &'a str,
    region_id: &'a str,
}

#[derive(Deserialize)]
struct CreateProjectResponse {
    project: Project,
    #[serde(default)]
    connection_uris: Vec<ConnectionUri>,
}

#[derive(Deserialize)]
struct Project {
    id: String,
}

#[derive(Deserialize)]
struct ConnectionUri {
    connection_uri: String,
}

pub struct NeonProvisioner {
    http: reqwest::Client,
    config: NeonConfig,
    region: String,
}

impl NeonProvisioner {
    pub fn new(config: NeonConfig, region: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            region,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl DatabaseProvisioner for NeonProvisioner {
    #[instrument(skip(self))]
    async fn create_database(&self, name: &str) -> Result<DatabaseHandle, ProviderError> {
        let body = CreateProjectRequest {
            project: ProjectSpec {
                name,
                region_id: &self.region,
            },
        };
        let response: CreateProjectResponse = self
            .http
            .post(self.url("/projects"))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ProviderError::from_http(PROVIDER, e))?
            .json()
            .await
            .map_err(|e| ProviderError::from_http(PROVIDER, e))?;

        let connection_uri = response
            .connection_uris
            .into_iter()
            .next()
            .map(|c| c.connection_uri)
            .ok_or_else(|| ProviderError::Rejected {
                provider: PROVIDER,
                message: "project created without a connection uri".into(),
            })?;

        debug!(project_id = %response.project.id, "Database project created");
        Ok(DatabaseHandle {
            project_id: response.project.id,
            connection_uri,
        })
    }

    #[instrument(skip(self, handle), fields(project_id = %handle.project_id))]
    async fn delete_database(&self, handle: &DatabaseHandle) -> Result<(), ProviderError> {
        let response = self
            .http
            .delete(self.url(&format!("/projects/{}", handle.project_id)))
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::from_http(PROVIDER, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Project already gone");
            return Ok(());
        }
        response
            .error_for_status()
            .map(|_| ())
            .map_err(|e| ProviderError::from_http(PROVIDER, e))
    }
}
