use super::tenant::TenantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DomainId(pub u32);

impl From<u32> for DomainId {
    fn from(id: u32) -> Self {
        DomainId(id)
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "domain_{}", self.0)
    }
}

/// Verification progress of a custom domain.
///
/// The `verified` and `ssl_enabled` flags are read off this single value, so a domain
/// can never report TLS without also reporting verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainStatus {
    /// Stored locally, not (yet) registered with the DNS provider.
    Pending,
    /// Registered with the provider, waiting for DNS to point at the platform.
    PendingVerification,
    Verified,
    SslEnabled,
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DomainStatus::Pending => "pending",
            DomainStatus::PendingVerification => "pending_verification",
            DomainStatus::Verified => "verified",
            DomainStatus::SslEnabled => "ssl_enabled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub id: DomainId,
    pub tenant_id: TenantId,
    pub name: String,
    pub status: DomainStatus,
    /// Handle returned by the DNS provider. `None` when registration failed or was
    /// never attempted.
    pub registration: Option<String>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Domain {
    pub fn verified(&self) -> bool {
        self.status >= DomainStatus::Verified
    }

    pub fn ssl_enabled(&self) -> bool {
        self.status == DomainStatus::SslEnabled
    }
}

#[derive(Debug, Clone)]
pub struct DomainCreate {
    pub tenant_id: TenantId,
    /// Already normalized and validated.
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DnsRecordType {
    A,
    #[serde(rename = "CNAME")]
    Cname,
}

/// A record the domain owner has to publish at their registrar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    #[serde(rename = "type")]
    pub record_type: DnsRecordType,
    pub name: String,
    pub value: String,
    pub ttl: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsInstructions {
    pub records: Vec<DnsRecord>,
    pub notes: Vec<String>,
}

/// Answer of a verification check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub domain: Domain,
    pub verified: bool,
    pub ssl_enabled: bool,
    /// False when the check was skipped because the domain was already fully enabled.
    pub checked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(status: DomainStatus) -> Domain {
        Domain {
            id: DomainId(1),
            tenant_id: TenantId(1),
            name: "example.com".into(),
            status,
            registration: None,
            last_checked_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn ssl_implies_verified_for_every_status() {
        for status in [
            DomainStatus::Pending,
            DomainStatus::PendingVerification,
            DomainStatus::Verified,
            DomainStatus::SslEnabled,
        ] {
            let d = domain(status);
            assert!(!d.ssl_enabled() || d.verified(), "{status}");
        }
        assert!(!domain(DomainStatus::PendingVerification).verified());
        assert!(domain(DomainStatus::Verified).verified());
    }
}
