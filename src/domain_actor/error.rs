//! Error types for the Domain actor.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DomainError {
    #[error("Domain not found: {0}")]
    NotFound(String),

    /// The name is already attached to some tenant.
    #[error("Domain already registered: {0}")]
    DomainTaken(String),

    #[error("Invalid domain: {0}")]
    Invalid(String),

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<String> for DomainError {
    fn from(msg: String) -> Self {
        DomainError::ActorCommunicationError(msg)
    }
}
