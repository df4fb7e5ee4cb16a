use super::actions::{SubscriptionAction, SubscriptionChange};
use super::error::SubscriptionError;
use crate::model::{Subscription, SubscriptionCreate, SubscriptionId, SubscriptionStatus};
use actor_framework::ActorEntity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Subscriptions change only through billing events.
#[derive(Debug, Clone)]
pub enum SubscriptionUpdate {}

impl Subscription {
    fn check_bound(&self, incoming: &str) -> Result<(), SubscriptionError> {
        match &self.external_id {
            Some(bound) if bound != incoming => Err(SubscriptionError::ExternalIdMismatch {
                bound: bound.clone(),
                incoming: incoming.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn is_stale(&self, event_at: DateTime<Utc>) -> bool {
        matches!(self.last_event_at, Some(last) if event_at < last)
    }
}

#[async_trait]
impl ActorEntity for Subscription {
    type Id = SubscriptionId;
    type Create = SubscriptionCreate;
    type Update = SubscriptionUpdate;
    type Action = SubscriptionAction;
    type ActionResult = SubscriptionChange;
    type Context = ();
    type Error = SubscriptionError;

    fn from_create_params(
        id: SubscriptionId,
        params: SubscriptionCreate,
    ) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id,
            tenant_id: params.tenant_id,
            external_id: params.external_id,
            status: params.status,
            plan: params.plan,
            current_period_end: None,
            last_event_at: None,
            created_at: params.created_at,
        })
    }

    /// One subscription per tenant.
    fn unique_key(&self) -> Option<String> {
        Some(self.tenant_id.to_string())
    }

    async fn on_update(
        &mut self,
        update: SubscriptionUpdate,
        _ctx: &(),
    ) -> Result<(), SubscriptionError> {
        match update {}
    }

    async fn handle_action(
        &mut self,
        action: SubscriptionAction,
        _ctx: &(),
    ) -> Result<SubscriptionChange, SubscriptionError> {
        let previous = self.status;
        let applied = match action {
            SubscriptionAction::Sync(sync) => {
                self.check_bound(&sync.external_id)?;
                if self.is_stale(sync.event_at) {
                    false
                } else {
                    self.external_id = Some(sync.external_id);
                    self.status = sync.status;
                    if let Some(plan) = sync.plan {
                        self.plan = plan;
                    }
                    if sync.current_period_end.is_some() {
                        self.current_period_end = sync.current_period_end;
                    }
                    self.last_event_at = Some(sync.event_at);
                    true
                }
            }
            SubscriptionAction::Cancel {
                external_id,
                event_at,
            } => {
                self.check_bound(&external_id)?;
                if self.is_stale(event_at) {
                    false
                } else {
                    self.external_id = Some(external_id);
                    self.status = SubscriptionStatus::Canceled;
                    self.last_event_at = Some(event_at);
                    true
                }
            }
        };
        Ok(SubscriptionChange {
            subscription: self.clone(),
            previous,
            applied,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SubscriptionSync, TenantId};
    use chrono::Duration;

    fn subscription() -> Subscription {
        Subscription::from_create_params(
            SubscriptionId(1),
            SubscriptionCreate {
                tenant_id: TenantId(1),
                plan: "standard".into(),
                status: SubscriptionStatus::Active,
                external_id: None,
                created_at: Utc::now(),
            },
        )
        .unwrap()
    }

    fn sync(status: SubscriptionStatus, event_at: DateTime<Utc>) -> SubscriptionAction {
        SubscriptionAction::Sync(SubscriptionSync {
            external_id: "sub_123".into(),
            status,
            plan: None,
            current_period_end: None,
            event_at,
        })
    }

    #[tokio::test]
    async fn older_event_does_not_regress_status() {
        let mut s = subscription();
        let now = Utc::now();
        s.handle_action(sync(SubscriptionStatus::Paused, now), &())
            .await
            .unwrap();

        let change = s
            .handle_action(
                sync(SubscriptionStatus::Active, now - Duration::minutes(1)),
                &(),
            )
            .await
            .unwrap();
        assert!(!change.applied);
        assert_eq!(change.subscription.status, SubscriptionStatus::Paused);
    }

    #[tokio::test]
    async fn bound_handle_rejects_foreign_event() {
        let mut s = subscription();
        s.handle_action(sync(SubscriptionStatus::Active, Utc::now()), &())
            .await
            .unwrap();

        let err = s
            .handle_action(
                SubscriptionAction::Sync(SubscriptionSync {
                    external_id: "sub_other".into(),
                    status: SubscriptionStatus::Active,
                    plan: None,
                    current_period_end: None,
                    event_at: Utc::now(),
                }),
                &(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::ExternalIdMismatch { .. }));
    }

    fn cancel(external_id: &str) -> SubscriptionAction {
        SubscriptionAction::Cancel {
            external_id: external_id.into(),
            event_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn cancel_reports_previous_status() {
        let mut s = subscription();
        let change = s.handle_action(cancel("sub_123"), &()).await.unwrap();
        assert!(change.applied);
        assert_eq!(change.previous, SubscriptionStatus::Active);
        assert_eq!(change.subscription.status, SubscriptionStatus::Canceled);
        assert_eq!(change.subscription.external_id.as_deref(), Some("sub_123"));
    }

    #[tokio::test]
    async fn cancel_for_another_handle_is_refused() {
        let mut s = subscription();
        s.handle_action(sync(SubscriptionStatus::Active, Utc::now()), &())
            .await
            .unwrap();

        let err = s.handle_action(cancel("sub_old"), &()).await.unwrap_err();
        assert!(matches!(
            err,
            SubscriptionError::ExternalIdMismatch { ref bound, ref incoming }
                if bound == "sub_123" && incoming == "sub_old"
        ));
        assert_eq!(s.status, SubscriptionStatus::Active);
    }
}
