use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SubscriptionError {
    #[error("Subscription not found: {0}")]
    NotFound(String),

    #[error("Tenant already has a subscription: {0}")]
    AlreadyExists(String),

    #[error("Subscription is bound to {bound}, event refers to {incoming}")]
    ExternalIdMismatch { bound: String, incoming: String },

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<String> for SubscriptionError {
    fn from(msg: String) -> Self {
        SubscriptionError::ActorCommunicationError(msg)
    }
}
