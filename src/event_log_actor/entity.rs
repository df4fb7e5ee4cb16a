use super::actions::{EventLogAction, EventLogActionResult};
use super::error::EventLogError;
use crate::model::{EventRecordId, EventState, ProcessedEvent, ProcessedEventCreate};
use actor_framework::ActorEntity;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub enum EventLogUpdate {}

#[async_trait]
impl ActorEntity for ProcessedEvent {
    type Id = EventRecordId;
    type Create = ProcessedEventCreate;
    type Update = EventLogUpdate;
    type Action = EventLogAction;
    type ActionResult = EventLogActionResult;
    type Context = ();
    type Error = EventLogError;

    fn from_create_params(
        id: EventRecordId,
        params: ProcessedEventCreate,
    ) -> Result<Self, Self::Error> {
        if params.event_id.is_empty() {
            return Err(EventLogError::Invalid("event id must not be empty".into()));
        }
        Ok(ProcessedEvent {
            id,
            event_id: params.event_id,
            event_type: params.event_type,
            state: EventState::Pending {
                claimed_at: params.claimed_at,
            },
        })
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.event_id.clone())
    }

    async fn on_update(&mut self, update: EventLogUpdate, _ctx: &()) -> Result<(), EventLogError> {
        match update {}
    }

    /// Only a pending claim may be released.
    async fn on_delete(&self, _ctx: &()) -> Result<(), EventLogError> {
        match self.state {
            EventState::Pending { .. } => Ok(()),
            EventState::Applied { .. } => Err(EventLogError::AlreadyApplied(self.event_id.clone())),
        }
    }

    async fn handle_action(
        &mut self,
        action: EventLogAction,
        _ctx: &(),
    ) -> Result<EventLogActionResult, EventLogError> {
        match action {
            EventLogAction::Reclaim { now, stale_after } => match self.state {
                EventState::Pending { claimed_at } if claimed_at + stale_after <= now => {
                    self.state = EventState::Pending { claimed_at: now };
                    Ok(EventLogActionResult::Reclaim(true))
                }
                _ => Ok(EventLogActionResult::Reclaim(false)),
            },
            EventLogAction::MarkApplied { at } => {
                self.state = EventState::Applied { applied_at: at };
                Ok(EventLogActionResult::MarkApplied(()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn record(claimed_at: chrono::DateTime<Utc>) -> ProcessedEvent {
        ProcessedEvent::from_create_params(
            EventRecordId(1),
            ProcessedEventCreate {
                event_id: "evt_1".into(),
                event_type: "invoice.paid".into(),
                claimed_at,
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn fresh_claim_cannot_be_taken() {
        let now = Utc::now();
        let mut r = record(now);
        let result = r
            .handle_action(
                EventLogAction::Reclaim {
                    now,
                    stale_after: Duration::seconds(30),
                },
                &(),
            )
            .await
            .unwrap();
        assert_eq!(result, EventLogActionResult::Reclaim(false));
    }

    #[tokio::test]
    async fn stale_claim_is_taken_once() {
        let now = Utc::now();
        let mut r = record(now - Duration::minutes(5));
        let reclaim = EventLogAction::Reclaim {
            now,
            stale_after: Duration::seconds(30),
        };
        assert_eq!(
            r.handle_action(reclaim.clone(), &()).await.unwrap(),
            EventLogActionResult::Reclaim(true)
        );
        assert_eq!(
            r.handle_action(reclaim, &()).await.unwrap(),
            EventLogActionResult::Reclaim(false)
        );
    }

    #[tokio::test]
    async fn applied_record_is_never_reclaimed_or_released() {
        let mut r = record(Utc::now() - Duration::hours(1));
        r.handle_action(EventLogAction::MarkApplied { at: Utc::now() }, &())
            .await
            .unwrap();
        let result = r
            .handle_action(
                EventLogAction::Reclaim {
                    now: Utc::now(),
                    stale_after: Duration::seconds(1),
                },
                &(),
            )
            .await
            .unwrap();
        assert_eq!(result, EventLogActionResult::Reclaim(false));
        assert!(r.on_delete(&()).await.is_err());
    }
}
