//! # Framework Errors
//!
//! Errors raised by the actor machinery itself, independent of any entity.
//! Entity-specific failures travel inside [`FrameworkError::EntityError`] and can be
//! recovered with [`FrameworkError::downcast_entity`].

/// Errors that can occur within the actor framework itself.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A create would have produced a second entity with the same unique key.
    #[error("Unique key already taken: {0}")]
    Conflict(String),
    #[error("Entity error: {0}")]
    EntityError(Box<dyn std::error::Error + Send + Sync>),
}

impl FrameworkError {
    /// Recovers the typed entity error, if this is an [`FrameworkError::EntityError`]
    /// wrapping an `E`. Any other error is handed back unchanged.
    pub fn downcast_entity<E>(self) -> Result<E, FrameworkError>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match self {
            FrameworkError::EntityError(inner) => match inner.downcast::<E>() {
                Ok(typed) => Ok(*typed),
                Err(other) => Err(FrameworkError::EntityError(other)),
            },
            other => Err(other),
        }
    }
}
