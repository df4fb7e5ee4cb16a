use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EventLogError {
    #[error("Event {0} was already applied")]
    AlreadyApplied(String),

    #[error("Invalid event record: {0}")]
    Invalid(String),

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<String> for EventLogError {
    fn from(msg: String) -> Self {
        EventLogError::ActorCommunicationError(msg)
    }
}
