use super::tenant::TenantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u32);

impl From<u32> for SubscriptionId {
    fn from(id: u32) -> Self {
        SubscriptionId(id)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscription_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Paused,
    Canceled,
}

impl SubscriptionStatus {
    /// Maps the billing provider's status vocabulary onto ours.
    pub fn from_external(status: &str) -> Self {
        match status {
            "active" | "trialing" => SubscriptionStatus::Active,
            "canceled" | "incomplete_expired" => SubscriptionStatus::Canceled,
            _ => SubscriptionStatus::Paused,
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

/// A tenant's plan subscription. One per tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub tenant_id: TenantId,
    /// Subscription id at the billing provider, once known.
    pub external_id: Option<String>,
    pub status: SubscriptionStatus,
    pub plan: String,
    pub current_period_end: Option<DateTime<Utc>>,
    /// Timestamp of the newest billing event applied; older events are ignored.
    pub last_event_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SubscriptionCreate {
    pub tenant_id: TenantId,
    pub plan: String,
    pub status: SubscriptionStatus,
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// State reported by one billing event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSync {
    pub external_id: String,
    pub status: SubscriptionStatus,
    pub plan: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub event_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_status_mapping() {
        assert_eq!(
            SubscriptionStatus::from_external("active"),
            SubscriptionStatus::Active
        );
        assert_eq!(
            SubscriptionStatus::from_external("trialing"),
            SubscriptionStatus::Active
        );
        assert_eq!(
            SubscriptionStatus::from_external("canceled"),
            SubscriptionStatus::Canceled
        );
        assert_eq!(
            SubscriptionStatus::from_external("past_due"),
            SubscriptionStatus::Paused
        );
        assert_eq!(
            SubscriptionStatus::from_external("something_new"),
            SubscriptionStatus::Paused
        );
    }
}
