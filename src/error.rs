use std::time::Duration;

use crate::IsolationLevel;

/// Error type for unit-of-work operations
#[derive(Debug, thiserror::Error)]
pub enum UnitOfWorkError {
    #[error("Invalid construction argument: {0} is required")]
    InvalidArgument(&'static str),

    #[error("Service not registered: {0}")]
    ServiceNotRegistered(&'static str),

    #[error("Isolation level {0:?} is not supported by this context")]
    UnsupportedIsolationLevel(IsolationLevel),

    #[error("Transaction exceeded its timeout of {0:?}")]
    TransactionTimedOut(Duration),

    #[error("Context is already open")]
    ContextAlreadyOpen,

    #[error("Context is closed")]
    ContextClosed,

    #[error("Transaction commit failed: {0}")]
    CommitFailed(String),

    #[error("Transaction rollback failed: {0}")]
    RollbackFailed(String),

    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Result type for unit-of-work operations
pub type UnitOfWorkResult<T> = Result<T, UnitOfWorkError>;
