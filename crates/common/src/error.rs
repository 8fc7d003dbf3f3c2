use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrgsyncError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid event payload: {0}")]
    Payload(String),

    #[error("checkpoint persist failed: {0}")]
    Persist(String),
}

pub type OrgsyncResult<T> = Result<T, OrgsyncError>;
