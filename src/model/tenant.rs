use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Primary key of a tenant record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(pub u32);

impl From<u32> for TenantId {
    fn from(id: u32) -> Self {
        TenantId(id)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tenant_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    Provisioning,
    Active,
    Suspended,
    Deleted,
}

impl TenantStatus {
    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Forward only, except `Active <-> Suspended`. `Deleted` is terminal and
    /// reachable from every other state.
    pub fn can_transition_to(self, next: TenantStatus) -> bool {
        use TenantStatus::*;
        matches!(
            (self, next),
            (Provisioning, Active)
                | (Active, Suspended)
                | (Suspended, Active)
                | (Provisioning, Deleted)
                | (Active, Deleted)
                | (Suspended, Deleted)
        )
    }
}

impl fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TenantStatus::Provisioning => "provisioning",
            TenantStatus::Active => "active",
            TenantStatus::Suspended => "suspended",
            TenantStatus::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

/// Reference to the tenant's dedicated database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseHandle {
    pub project_id: String,
    pub connection_uri: String,
}

/// URLs of the tenant's commerce backend deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendEndpoints {
    pub api_url: String,
    pub admin_url: String,
}

/// Lease on a tenant's provisioning run. Only the holder may write progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningClaim {
    pub run_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl ProvisioningClaim {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningFailure {
    /// Name of the step that halted the run.
    pub step: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningProgress {
    pub claim: Option<ProvisioningClaim>,
    /// Set while the tenant sits in the `failed` sub-state of `provisioning`.
    pub failure: Option<ProvisioningFailure>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// One customer's shop instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub slug: String,
    pub subdomain: String,
    pub owner_id: String,
    pub status: TenantStatus,
    pub database: Option<DatabaseHandle>,
    pub backend: Option<BackendEndpoints>,
    /// Handles of optional integrations keyed by integration name ("email", "sms").
    pub integrations: BTreeMap<String, String>,
    pub settings: Map<String, Value>,
    pub provisioning: ProvisioningProgress,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    /// `provisioning` with a recorded failure.
    pub fn is_failed(&self) -> bool {
        self.status == TenantStatus::Provisioning && self.provisioning.failure.is_some()
    }

    pub fn has_all_resources(&self) -> bool {
        self.database.is_some() && self.backend.is_some()
    }
}

/// Payload for creating a tenant. The slug and subdomain are derived by the caller.
#[derive(Debug, Clone)]
pub struct TenantCreate {
    pub name: String,
    pub slug: String,
    pub subdomain: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

/// Caller-editable tenant fields. `settings` is merged key by key; a `null` value
/// removes the key.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TenantUpdate {
    pub name: Option<String>,
    pub settings: Option<Map<String, Value>>,
}

/// Lowercase, URL-safe identifier derived from a display name.
///
/// Runs of anything outside `[a-z0-9]` collapse into one `-`; leading and trailing
/// dashes are dropped. May return an empty string.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}
