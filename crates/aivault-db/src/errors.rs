use diesel::result::Error as DieselError;
use std::fmt::Display;
use thiserror::Error;

/// Error type for database pool initialization
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("cannot init database pool : {0}")]
    Pool(String),
    #[error("cannot run database migrations : {0}")]
    Migration(String),
}

/// Unified database error type with context for runtime operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to get connection from pool for operation '{operation}': {message}")]
    PoolError { operation: String, message: String },

    #[error("Database interaction failed for operation '{operation}': {message}")]
    InteractionError { operation: String, message: String },

    #[error("Record not found in operation '{operation}'")]
    NotFound { operation: String },

    #[error("Database query error in operation '{operation}': {message}")]
    QueryError { operation: String, message: String },

    #[error("Unique constraint violation in operation '{operation}': {message}")]
    UniqueViolation { operation: String, message: String },

    #[error("Foreign key constraint violation in operation '{operation}': {message}")]
    ForeignKeyViolation { operation: String, message: String },
}

impl DatabaseError {
    /// Create a `NotFound` error with operation context
    pub fn not_found(operation: impl Display) -> Self {
        Self::NotFound {
            operation: operation.to_string(),
        }
    }

    /// Check if this error is a `NotFound` variant
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Extract the operation context from the error
    pub fn operation(&self) -> &str {
        match self {
            Self::PoolError { operation, .. }
            | Self::InteractionError { operation, .. }
            | Self::NotFound { operation }
            | Self::QueryError { operation, .. }
            | Self::UniqueViolation { operation, .. }
            | Self::ForeignKeyViolation { operation, .. } => operation,
        }
    }

    /// Attach the operation name to an error converted without context.
    #[must_use]
    pub fn with_operation(self, context: impl Display) -> Self {
        let context = context.to_string();
        match self {
            Self::PoolError { message, .. } => Self::PoolError {
                operation: context,
                message,
            },
            Self::InteractionError { message, .. } => Self::InteractionError {
                operation: context,
                message,
            },
            Self::NotFound { .. } => Self::NotFound { operation: context },
            Self::QueryError { message, .. } => Self::QueryError {
                operation: context,
                message,
            },
            Self::UniqueViolation { message, .. } => Self::UniqueViolation {
                operation: context,
                message,
            },
            Self::ForeignKeyViolation { message, .. } => Self::ForeignKeyViolation {
                operation: context,
                message,
            },
        }
    }
}

impl From<DieselError> for DatabaseError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound {
                operation: "unknown".to_string(),
            },
            DieselError::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                info,
            ) => Self::UniqueViolation {
                operation: "unknown".to_string(),
                message: info.message().to_string(),
            },
            DieselError::DatabaseError(
                diesel::result::DatabaseErrorKind::ForeignKeyViolation,
                info,
            ) => Self::ForeignKeyViolation {
                operation: "unknown".to_string(),
                message: info.message().to_string(),
            },
            other => Self::QueryError {
                operation: "unknown".to_string(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diesel_not_found_maps_to_not_found() {
        let err: DatabaseError = DieselError::NotFound.into();
        assert!(err.is_not_found());
        assert_eq!(err.operation(), "unknown");
    }

    #[test]
    fn with_operation_keeps_variant_and_message() {
        let err = DatabaseError::QueryError {
            operation: "unknown".to_string(),
            message: "syntax error".to_string(),
        }
        .with_operation("list strategies");

        assert_eq!(err.operation(), "list strategies");
        assert!(err.to_string().contains("syntax error"));
        assert!(!err.is_not_found());
    }
}
