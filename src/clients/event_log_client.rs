//! # Event Log Client
//!
//! Turns the event log's conditional insert into a claim protocol for billing events.
use crate::event_log_actor::{EventLogAction, EventLogActionResult, EventLogError};
use crate::model::{EventRecordId, EventState, ProcessedEvent, ProcessedEventCreate};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, instrument};

/// Result of trying to claim an event id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClaim {
    /// This delivery owns the event and must apply it.
    Claimed(EventRecordId),
    AlreadyApplied,
    /// Another delivery holds a fresh claim.
    InFlight,
}

/// Client for interacting with the Event Log actor.
#[derive(Clone)]
pub struct EventLogClient {
    inner: ResourceClient<ProcessedEvent>,
}

impl EventLogClient {
    pub fn new(inner: ResourceClient<ProcessedEvent>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ActorClient<ProcessedEvent> for EventLogClient {
    type Error = EventLogError;

    fn inner(&self) -> &ResourceClient<ProcessedEvent> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        e.downcast_entity::<EventLogError>()
            .unwrap_or_else(|e| EventLogError::ActorCommunicationError(e.to_string()))
    }
}

impl EventLogClient {
    #[instrument(skip(self))]
    pub async fn claim(
        &self,
        event_id: &str,
        event_type: &str,
        now: DateTime<Utc>,
        stale_after: Duration,
    ) -> Result<EventClaim, EventLogError> {
        let params = ProcessedEventCreate {
            event_id: event_id.to_string(),
            event_type: event_type.to_string(),
            claimed_at: now,
        };
        match self.inner.create(params).await {
            Ok(id) => return Ok(EventClaim::Claimed(id)),
            Err(FrameworkError::Conflict(_)) => {}
            Err(e) => return Err(Self::map_error(e)),
        }

        let Some(existing) = self
            .inner
            .find_by_key(event_id)
            .await
            .map_err(Self::map_error)?
        else {
            // released between our create and lookup; the redelivery will claim it
            return Ok(EventClaim::InFlight);
        };

        if let EventState::Applied { .. } = existing.state {
            return Ok(EventClaim::AlreadyApplied);
        }

        debug!(event_id, "Event claimed by another delivery, checking staleness");
        match self
            .inner
            .perform_action(existing.id, EventLogAction::Reclaim { now, stale_after })
            .await
            .map_err(Self::map_error)?
        {
            EventLogActionResult::Reclaim(true) => Ok(EventClaim::Claimed(existing.id)),
            EventLogActionResult::Reclaim(false) => Ok(EventClaim::InFlight),
            EventLogActionResult::MarkApplied(_) => {
                unreachable!("Reclaim action must return Reclaim result")
            }
        }
    }

    pub async fn mark_applied(
        &self,
        id: EventRecordId,
        at: DateTime<Utc>,
    ) -> Result<(), EventLogError> {
        self.inner
            .perform_action(id, EventLogAction::MarkApplied { at })
            .await
            .map(|_| ())
            .map_err(Self::map_error)
    }

    /// Drops a pending claim so a later delivery can retry the event.
    pub async fn release(&self, id: EventRecordId) -> Result<(), EventLogError> {
        self.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actor_framework::mock::MockClient;

    fn record(state: EventState) -> ProcessedEvent {
        ProcessedEvent {
            id: EventRecordId(4),
            event_id: "evt_1".into(),
            event_type: "invoice.paid".into(),
            state,
        }
    }

    #[tokio::test]
    async fn test_conflict_on_applied_event_is_already_applied() {
        let mut mock = MockClient::<ProcessedEvent>::new();
        mock.expect_create()
            .return_err(FrameworkError::Conflict("evt_1".into()));
        mock.expect_find_by_key("evt_1")
            .return_ok(Some(record(EventState::Applied {
                applied_at: Utc::now(),
            })));

        let client = EventLogClient::new(mock.client());
        let claim = client
            .claim("evt_1", "invoice.paid", Utc::now(), Duration::seconds(60))
            .await
            .unwrap();
        assert_eq!(claim, EventClaim::AlreadyApplied);
        mock.verify();
    }

    #[tokio::test]
    async fn test_conflict_on_fresh_pending_event_is_in_flight() {
        let mut mock = MockClient::<ProcessedEvent>::new();
        mock.expect_create()
            .return_err(FrameworkError::Conflict("evt_1".into()));
        mock.expect_find_by_key("evt_1")
            .return_ok(Some(record(EventState::Pending {
                claimed_at: Utc::now(),
            })));
        mock.expect_action(EventRecordId(4))
            .return_ok(EventLogActionResult::Reclaim(false));

        let client = EventLogClient::new(mock.client());
        let claim = client
            .claim("evt_1", "invoice.paid", Utc::now(), Duration::seconds(60))
            .await
            .unwrap();
        assert_eq!(claim, EventClaim::InFlight);
        mock.verify();
    }
}
