use crate::verification::DomainWorkflow;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Re-checks unverified domains every `interval` until the task is aborted. The first
/// sweep runs one interval after start.
pub fn spawn_verification_sweep(workflow: DomainWorkflow, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;
        info!(?interval, "Domain verification sweep started");

        loop {
            ticker.tick().await;
            match workflow.verify_pending().await {
                Ok(results) => {
                    let verified = results.iter().filter(|r| r.verified).count();
                    debug!(checked = results.len(), verified, "Verification sweep done");
                }
                Err(e) => warn!(error = %e, "Verification sweep failed"),
            }
        }
    })
}
