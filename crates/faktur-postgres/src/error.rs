//! Error handling for database operations.
//!
//! [`PgError`] folds pool, connection, query, and migration failures into
//! one type and exposes the constraint-violation view the reconciliation
//! logic needs to treat a duplicate processed invoice as dedup-success.

use std::borrow::Cow;

use deadpool::managed::TimeoutType;
use diesel::result::{ConnectionError, Error};
use diesel_async::pooled_connection::PoolError as DieselPoolError;
use diesel_async::pooled_connection::deadpool::PoolError as DeadpoolError;

use crate::types::ConstraintViolation;

/// Type-erased error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Specialized [`Result`] type for database operations.
pub type PgResult<T, E = PgError> = Result<T, E>;

/// Error type for all PostgreSQL operations in this crate.
#[derive(Debug, thiserror::Error)]
#[must_use = "database errors should be handled appropriately"]
pub enum PgError {
    /// Invalid or incomplete database configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A pool operation (create, checkout, recycle) timed out.
    #[error("Database operation timed out")]
    Timeout(TimeoutType),

    /// Failed to establish or maintain a database connection.
    #[error("Database connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Applying embedded migrations failed.
    #[error("Database migration error: {0}")]
    Migration(BoxError),

    /// Query execution failed. Constraint violations arrive here; see
    /// [`PgError::constraint_violation`].
    #[error("Database query error: {0}")]
    Query(#[from] Error),

    /// Failure outside the categories above.
    #[error("Unexpected error: {0}")]
    Unexpected(Cow<'static, str>),
}

impl PgError {
    /// Name of the violated constraint, when this is a constraint error.
    pub fn constraint(&self) -> Option<&str> {
        let PgError::Query(Error::DatabaseError(_, info)) = self else {
            return None;
        };

        info.constraint_name()
    }

    /// The violated constraint resolved against the known schema
    /// constraints, when this error represents one of them.
    pub fn constraint_violation(&self) -> Option<ConstraintViolation> {
        self.constraint().and_then(ConstraintViolation::new)
    }

    /// Returns whether this error is the processed-row dedup conflict:
    /// another delivery of the same `(sender, invoice_number)` reached
    /// `processed` first. Callers resolve it as success, not failure.
    pub fn is_dedup_conflict(&self) -> bool {
        self.constraint_violation() == Some(ConstraintViolation::DuplicateProcessedInvoice)
    }

    /// Returns whether retrying the operation might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PgError::Timeout(_) | PgError::Connection(ConnectionError::BadConnection(_))
        )
    }

    /// Returns whether the failure is permanent for this input.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }
}

impl From<DeadpoolError> for PgError {
    fn from(value: DeadpoolError) -> Self {
        match value {
            DeadpoolError::Timeout(timeout) => Self::Timeout(timeout),
            DeadpoolError::Backend(DieselPoolError::QueryError(error)) => Self::Query(error),
            DeadpoolError::Backend(DieselPoolError::ConnectionError(error)) => {
                Self::Connection(error)
            }
            DeadpoolError::PostCreateHook(error) => {
                // No post-create hooks are registered, but handle gracefully:
                tracing::warn!("Unexpected post-create hook error: {}", error);
                Self::Unexpected(error.to_string().into())
            }
            DeadpoolError::NoRuntimeSpecified => {
                // Should not happen as we specify the tokio runtime:
                tracing::error!("No tokio runtime specified for connection pool");
                Self::Unexpected("No runtime specified".into())
            }
            DeadpoolError::Closed => {
                // Pool was closed, treat as connection error:
                Self::Connection(ConnectionError::InvalidConnectionUrl(
                    "Connection pool is closed".into(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_transient() {
        let error = PgError::Timeout(TimeoutType::Wait);
        assert!(error.is_transient());
        assert!(!error.is_permanent());
    }

    #[test]
    fn test_config_error_is_permanent() {
        let error = PgError::Config("missing url".into());
        assert!(error.is_permanent());
        assert_eq!(error.constraint(), None);
        assert!(!error.is_dedup_conflict());
    }
}
