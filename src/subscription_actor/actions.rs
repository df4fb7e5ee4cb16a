use crate::model::{Subscription, SubscriptionStatus, SubscriptionSync};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub enum SubscriptionAction {
    /// Apply the state carried by a subscription created/updated event.
    Sync(SubscriptionSync),
    /// Apply a subscription deleted event. Refused when the subscription is bound to a
    /// different external handle.
    Cancel {
        external_id: String,
        event_at: DateTime<Utc>,
    },
}

/// What an action did to the subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionChange {
    pub subscription: Subscription,
    pub previous: SubscriptionStatus,
    /// False when the event was older than the last one applied.
    pub applied: bool,
}
