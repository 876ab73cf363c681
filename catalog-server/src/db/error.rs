//! Persistence error kinds

use thiserror::Error;
use tokio::task::JoinError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a unit of work or of gateway initialization.
///
/// `Transient` failures are connection-level and may succeed if the caller
/// tries again. `Permanent` failures are data-level and will not.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("store unavailable: {source}")]
    Transient {
        #[source]
        source: BoxError,
    },

    #[error("store rejected the operation: {source}")]
    Permanent {
        #[source]
        source: BoxError,
    },
}

impl PersistenceError {
    pub fn transient(source: impl Into<BoxError>) -> Self {
        Self::Transient {
            source: source.into(),
        }
    }

    pub fn permanent(source: impl Into<BoxError>) -> Self {
        Self::Permanent {
            source: source.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

impl From<sqlx::Error> for PersistenceError {
    fn from(err: sqlx::Error) -> Self {
        if is_transient(&err) {
            Self::transient(err)
        } else {
            Self::permanent(err)
        }
    }
}

impl From<JoinError> for PersistenceError {
    fn from(err: JoinError) -> Self {
        // Cancelled means the worker runtime is shutting down.
        if err.is_cancelled() {
            Self::transient(err)
        } else {
            Self::permanent(err)
        }
    }
}

fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => db.code().is_some_and(|code| is_transient_sqlstate(&code)),
        _ => false,
    }
}

/// SQLSTATE codes worth retrying: connection exceptions (08), insufficient
/// resources (53), operator intervention (57), serialization failure and
/// deadlock.
fn is_transient_sqlstate(code: &str) -> bool {
    matches!(code, "40001" | "40P01")
        || code.starts_with("08")
        || code.starts_with("53")
        || code.starts_with("57")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn io_errors_are_transient() {
        let err = PersistenceError::from(sqlx::Error::Io(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "reset",
        )));
        assert!(err.is_retryable());
    }

    #[test]
    fn pool_timeout_is_transient() {
        assert!(PersistenceError::from(sqlx::Error::PoolTimedOut).is_retryable());
    }

    #[test]
    fn mapping_errors_are_permanent() {
        let err = PersistenceError::from(sqlx::Error::ColumnNotFound("price".into()));
        assert!(!err.is_retryable());
        assert!(matches!(err, PersistenceError::Permanent { .. }));
    }

    #[test]
    fn row_not_found_is_permanent() {
        assert!(!PersistenceError::from(sqlx::Error::RowNotFound).is_retryable());
    }

    #[test]
    fn sqlstate_classes() {
        assert!(is_transient_sqlstate("08006"));
        assert!(is_transient_sqlstate("40001"));
        assert!(is_transient_sqlstate("57P01"));
        assert!(!is_transient_sqlstate("23505"));
        assert!(!is_transient_sqlstate("22P02"));
    }

    #[test]
    fn display_includes_source() {
        let err = PersistenceError::permanent("duplicate key");
        assert_eq!(err.to_string(), "store rejected the operation: duplicate key");
    }
}
