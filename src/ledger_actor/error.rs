use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LedgerError {
    #[error("Invalid transaction: {0}")]
    Invalid(String),

    #[error("Ledger entries are immutable")]
    Immutable,

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<String> for LedgerError {
    fn from(msg: String) -> Self {
        LedgerError::ActorCommunicationError(msg)
    }
}
