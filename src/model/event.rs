use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventRecordId(pub u32);

impl From<u32> for EventRecordId {
    fn from(id: u32) -> Self {
        EventRecordId(id)
    }
}

impl fmt::Display for EventRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EventState {
    /// A delivery claimed the event and is applying it.
    Pending { claimed_at: DateTime<Utc> },
    Applied { applied_at: DateTime<Utc> },
}

/// Idempotency record for one external billing event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedEvent {
    pub id: EventRecordId,
    pub event_id: String,
    pub event_type: String,
    pub state: EventState,
}

#[derive(Debug, Clone)]
pub struct ProcessedEventCreate {
    pub event_id: String,
    pub event_type: String,
    pub claimed_at: DateTime<Utc>,
}
