//! The ordered provisioning step table.

use crate::model::Tenant;
use std::fmt;

/// What a failed step does to the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    /// Record the failure on the tenant and stop.
    Halt,
    /// Log and move on; the tenant can go live without it.
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvisioningStep {
    AllocateDatabase,
    DeployBackend,
    EnableEmail,
    EnableSms,
    RegisterSubscription,
}

/// Steps in execution order. The backend needs the database connection string, so the
/// order is fixed.
pub const PROVISIONING_STEPS: [ProvisioningStep; 5] = [
    ProvisioningStep::AllocateDatabase,
    ProvisioningStep::DeployBackend,
    ProvisioningStep::EnableEmail,
    ProvisioningStep::EnableSms,
    ProvisioningStep::RegisterSubscription,
];

pub const EMAIL_INTEGRATION: &str = "email";
pub const SMS_INTEGRATION: &str = "sms";

impl ProvisioningStep {
    pub fn name(self) -> &'static str {
        match self {
            ProvisioningStep::AllocateDatabase => "allocate_database",
            ProvisioningStep::DeployBackend => "deploy_backend",
            ProvisioningStep::EnableEmail => "enable_email",
            ProvisioningStep::EnableSms => "enable_sms",
            ProvisioningStep::RegisterSubscription => "register_subscription",
        }
    }

    pub fn policy(self) -> StepPolicy {
        match self {
            ProvisioningStep::EnableEmail | ProvisioningStep::EnableSms => StepPolicy::Continue,
            _ => StepPolicy::Halt,
        }
    }

    /// Whether the tenant record already carries this step's output. The subscription
    /// lives in its own store, so [`ProvisioningStep::RegisterSubscription`] is checked
    /// by the workflow instead and always reports `false` here.
    pub fn is_recorded(self, tenant: &Tenant) -> bool {
        match self {
            ProvisioningStep::AllocateDatabase => tenant.database.is_some(),
            ProvisioningStep::DeployBackend => tenant.backend.is_some(),
            ProvisioningStep::EnableEmail => tenant.integrations.contains_key(EMAIL_INTEGRATION),
            ProvisioningStep::EnableSms => tenant.integrations.contains_key(SMS_INTEGRATION),
            ProvisioningStep::RegisterSubscription => false,
        }
    }
}

impl fmt::Display for ProvisioningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
