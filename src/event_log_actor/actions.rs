use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone)]
pub enum EventLogAction {
    /// Take over a pending claim older than `stale_after`.
    Reclaim {
        now: DateTime<Utc>,
        stale_after: Duration,
    },
    MarkApplied { at: DateTime<Utc> },
}

/// Results from EventLogActions - variants match 1:1 with EventLogAction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventLogActionResult {
    /// Whether the caller now holds the claim.
    Reclaim(bool),
    MarkApplied(()),
}
