use aivault_chain::ChainError;
use aivault_db::DatabaseError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Strategy {strategy_id} is not pending (status: {status})")]
    NotPending { strategy_id: Uuid, status: String },
    #[error(transparent)]
    Database(DatabaseError),
    #[error(transparent)]
    Chain(ChainError),
    #[error("Execution {execution_id} failed: {message}")]
    ExecutionFailed {
        execution_id: Uuid,
        tx_hash: Option<String>,
        message: String,
    },
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        if err.is_not_found() {
            Self::NotFound(err.operation().to_string())
        } else {
            Self::Database(err)
        }
    }
}

impl From<ChainError> for ServiceError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::InvalidAddress(_) | ChainError::InvalidArgument(_) => {
                Self::InvalidRequest(err.to_string())
            }
            other => Self::Chain(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_rows_become_not_found() {
        let err: ServiceError = DatabaseError::not_found("strategy 42").into();
        assert!(matches!(err, ServiceError::NotFound(ref what) if what == "strategy 42"));
        assert_eq!(err.to_string(), "strategy 42 not found");
    }

    #[test]
    fn test_bad_chain_arguments_are_caller_errors() {
        let err: ServiceError = ChainError::InvalidAddress("0x12".into()).into();
        assert!(matches!(err, ServiceError::InvalidRequest(_)));

        let err: ServiceError = ChainError::Rpc("connection refused".into()).into();
        assert!(matches!(err, ServiceError::Chain(_)));
    }
}
