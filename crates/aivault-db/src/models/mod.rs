pub mod allocation;
pub mod execution;
pub mod strategy;
pub mod transaction;
pub mod vault;

pub use allocation::{Allocation, NewAllocation};
pub use execution::{
    Execution, ExecutionDetails, ExecutionKind, ExecutionOutcomeUpdate, ExecutionStatus,
    NewExecution,
};
pub use strategy::{NewStrategy, Strategy, StrategyStatus, StrategyWithAllocations};
pub use transaction::{NewTransactionRecord, TransactionRecord, TransactionStatus};
pub use vault::{NewVault, Vault};
