use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateLogError {
    #[error("state write failed: {0}")]
    WriteFailed(String),

    #[error("state flush failed: {0}")]
    FlushFailed(String),

    #[error("state appender close failed: {0}")]
    CloseFailed(String),

    #[error("state query failed: {0}")]
    QueryFailed(String),

    #[error("state store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("state appender is closed")]
    Closed,

    #[error("invalid fingerprint {0}")]
    InvalidFingerprint(String),

    #[error("invalid label {0}")]
    InvalidLabel(String),

    #[error("invalid alert state '{0}'")]
    InvalidState(String),
}
