//! Custom actions for the Tenant actor.
//!
//! Every status change and every piece of provisioning progress is an action, so the
//! check ("is this run still the claim holder?", "is the tenant active?") and the write
//! happen in one step inside the actor.

use crate::model::{BackendEndpoints, DatabaseHandle, ProvisioningFailure};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Actions on a tenant. Each one answers with the tenant as stored afterwards.
#[derive(Debug, Clone)]
pub enum TenantAction {
    /// Take the provisioning lease. Fails while another run holds a live claim.
    ClaimProvisioning {
        run_id: Uuid,
        now: DateTime<Utc>,
        lease: Duration,
    },
    /// Give the lease back without recording anything. No-op for other runs.
    ReleaseProvisioning { run_id: Uuid },
    RecordDatabase {
        run_id: Uuid,
        handle: DatabaseHandle,
    },
    RecordBackend {
        run_id: Uuid,
        endpoints: BackendEndpoints,
    },
    RecordIntegration {
        run_id: Uuid,
        name: String,
        handle: String,
    },
    /// Halt the run: keeps the tenant in `provisioning` with the failure attached.
    RecordFailure {
        run_id: Uuid,
        failure: ProvisioningFailure,
    },
    /// `provisioning -> active`; requires database and backend handles. With `suspend`
    /// the tenant goes straight on to `suspended`, for a subscription canceled mid-run.
    CompleteProvisioning {
        run_id: Uuid,
        now: DateTime<Utc>,
        suspend: bool,
    },
    /// Drop the resource handles after their external resources were released.
    /// A provisioning tenant must be claimed by `run_id`; a deleted one needs no claim.
    ClearResources { run_id: Option<Uuid> },
    /// `active -> suspended`; a no-op in any other state.
    Suspend,
    /// `suspended -> active`; a no-op in any other state.
    Reactivate,
    /// `* -> deleted`; a no-op when already deleted.
    SoftDelete,
}
