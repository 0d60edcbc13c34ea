//! Service layer between the HTTP handlers, the database and the chain.

pub mod error;
pub mod operations;
pub mod outcome;
pub mod repository;
pub mod service;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::ServiceError;
pub use operations::{AccountSnapshot, MAX_SLIPPAGE_BPS, TokenBalance, VaultOperations};
pub use outcome::{SettledExecution, SubmissionOutcome};
pub use repository::{PgStrategyRepository, StrategyRepository};
pub use service::{
    AllocationDraft, StrategyDraft, StrategyService, VaultRegistration, parse_amount,
    parse_total_assets,
};
