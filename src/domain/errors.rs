//! Domain error types
//!
//! Not-found is never an error here: lookups return `Option` and the caller
//! decides what absence means.

use sea_orm::{DbErr, RuntimeErr};

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Malformed input, rejected before the store is touched
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unique or foreign-key violation reported by the store at commit
    #[error("Constraint violation: {message}")]
    ConstraintViolation {
        message: String,
        #[source]
        source: DbErr,
    },

    /// An update or delete matched no stored row
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Connection or pool failure; safe to retry at the caller's discretion
    #[error("Transient store error: {source}")]
    TransientStore {
        #[source]
        source: DbErr,
    },

    /// The caller's cancellation signal fired
    #[error("Operation cancelled")]
    Cancelled,

    /// Anything else, with the original cause preserved
    #[error("{context}: {source}")]
    Unexpected {
        context: String,
        #[source]
        source: DbErr,
    },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    /// Replace the context of an `Unexpected` error; other kinds pass through.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        match self {
            DomainError::Unexpected { source, .. } => DomainError::Unexpected {
                context: context.into(),
                source,
            },
            other => other,
        }
    }

    /// The store committed an insert but handed no row back
    pub fn not_inserted(what: &str) -> Self {
        DomainError::Unexpected {
            context: format!("store did not report the inserted {what}"),
            source: DbErr::RecordNotInserted,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::TransientStore { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreFailure {
    Constraint,
    Transient,
    Stale,
    Other,
}

fn classify(e: &DbErr) -> StoreFailure {
    match e {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => return StoreFailure::Transient,
        DbErr::RecordNotUpdated => return StoreFailure::Stale,
        _ => {}
    }

    if let DbErr::Exec(RuntimeErr::SqlxError(err)) | DbErr::Query(RuntimeErr::SqlxError(err)) = e
    {
        match err {
            sqlx::Error::Database(db_err) => match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation
                | sqlx::error::ErrorKind::ForeignKeyViolation
                | sqlx::error::ErrorKind::NotNullViolation
                | sqlx::error::ErrorKind::CheckViolation => return StoreFailure::Constraint,
                _ => {}
            },
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                return StoreFailure::Transient;
            }
            _ => {}
        }
    }

    // SQLite reports primary-key clashes with the unique-constraint message
    let text = e.to_string();
    if text.contains("UNIQUE constraint failed") || text.contains("FOREIGN KEY constraint failed")
    {
        return StoreFailure::Constraint;
    }
    if text.contains("database is locked") {
        return StoreFailure::Transient;
    }

    StoreFailure::Other
}

impl From<DbErr> for DomainError {
    fn from(e: DbErr) -> Self {
        match classify(&e) {
            StoreFailure::Constraint => DomainError::ConstraintViolation {
                message: e.to_string(),
                source: e,
            },
            StoreFailure::Transient => DomainError::TransientStore { source: e },
            StoreFailure::Stale => DomainError::Conflict(e.to_string()),
            StoreFailure::Other => DomainError::Unexpected {
                context: "store operation failed".to_string(),
                source: e,
            },
        }
    }
}
