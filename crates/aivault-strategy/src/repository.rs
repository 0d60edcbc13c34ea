use aivault_db::models::{
    Execution, ExecutionDetails, ExecutionKind, ExecutionOutcomeUpdate, ExecutionStatus,
    NewAllocation, NewExecution, NewStrategy, NewTransactionRecord, NewVault, Strategy,
    StrategyStatus, StrategyWithAllocations, Vault,
};
use aivault_db::{AivaultPool, DatabaseError, Pagination};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_diesel::postgres::Pool;
use uuid::Uuid;

/// Storage used by the strategy and vault services.
#[async_trait]
pub trait StrategyRepository: Send + Sync {
    async fn create_strategy(
        &self,
        strategy: NewStrategy,
        allocations: Vec<NewAllocation>,
    ) -> Result<StrategyWithAllocations, DatabaseError>;

    async fn find_strategy(&self, id: Uuid) -> Result<StrategyWithAllocations, DatabaseError>;

    async fn list_strategies(
        &self,
        pagination: Pagination,
    ) -> Result<Vec<StrategyWithAllocations>, DatabaseError>;

    async fn create_vault(&self, vault: NewVault) -> Result<Vault, DatabaseError>;

    async fn find_vault(&self, id: Uuid) -> Result<Vault, DatabaseError>;

    async fn list_vaults(&self, pagination: Pagination) -> Result<Vec<Vault>, DatabaseError>;

    async fn find_execution(&self, id: Uuid) -> Result<ExecutionDetails, DatabaseError>;

    async fn list_executions(
        &self,
        pagination: Pagination,
    ) -> Result<Vec<ExecutionDetails>, DatabaseError>;

    /// Claims a pending strategy and opens its execution atomically. `None`
    /// when the strategy was not pending.
    async fn begin_strategy_execution(
        &self,
        strategy_id: Uuid,
        vault_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Execution>, DatabaseError>;

    async fn begin_withdraw_all(&self, vault_id: Uuid) -> Result<Execution, DatabaseError>;

    async fn finalize_execution(
        &self,
        id: Uuid,
        update: ExecutionOutcomeUpdate,
        transaction: Option<NewTransactionRecord>,
        strategy_status: Option<StrategyStatus>,
    ) -> Result<Execution, DatabaseError>;
}

#[derive(Clone)]
pub struct PgStrategyRepository {
    pool: Pool,
}

impl PgStrategyRepository {
    pub const fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StrategyRepository for PgStrategyRepository {
    async fn create_strategy(
        &self,
        strategy: NewStrategy,
        allocations: Vec<NewAllocation>,
    ) -> Result<StrategyWithAllocations, DatabaseError> {
        self.pool
            .interact_with_context(format!("create strategy {}", strategy.id), move |conn| {
                Strategy::create_with_allocations(&strategy, &allocations, conn)
            })
            .await
    }

    async fn find_strategy(&self, id: Uuid) -> Result<StrategyWithAllocations, DatabaseError> {
        self.pool
            .interact_with_context(format!("strategy {id}"), move |conn| {
                Strategy::find_with_allocations(id, conn)
            })
            .await
    }

    async fn list_strategies(
        &self,
        pagination: Pagination,
    ) -> Result<Vec<StrategyWithAllocations>, DatabaseError> {
        self.pool
            .interact_with_context("list strategies".to_string(), move |conn| {
                Strategy::list_with_allocations(pagination, conn)
            })
            .await
    }

    async fn create_vault(&self, vault: NewVault) -> Result<Vault, DatabaseError> {
        self.pool
            .interact_with_context(format!("register vault {}", vault.address), move |conn| {
                Vault::create(&vault, conn)
            })
            .await
    }

    async fn find_vault(&self, id: Uuid) -> Result<Vault, DatabaseError> {
        self.pool
            .interact_with_context(format!("vault {id}"), move |conn| Vault::find_by_id(id, conn))
            .await
    }

    async fn list_vaults(&self, pagination: Pagination) -> Result<Vec<Vault>, DatabaseError> {
        self.pool
            .interact_with_context("list vaults".to_string(), move |conn| {
                Vault::list(pagination, conn)
            })
            .await
    }

    async fn find_execution(&self, id: Uuid) -> Result<ExecutionDetails, DatabaseError> {
        self.pool
            .interact_with_context(format!("execution {id}"), move |conn| {
                Execution::find_details(id, conn)
            })
            .await
    }

    async fn list_executions(
        &self,
        pagination: Pagination,
    ) -> Result<Vec<ExecutionDetails>, DatabaseError> {
        self.pool
            .interact_with_context("list executions".to_string(), move |conn| {
                Execution::list_details(pagination, conn)
            })
            .await
    }

    async fn begin_strategy_execution(
        &self,
        strategy_id: Uuid,
        vault_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Execution>, DatabaseError> {
        self.pool
            .interact_with_context(
                format!("begin execution of strategy {strategy_id}"),
                move |conn| Execution::begin_for_strategy(strategy_id, vault_id, now, conn),
            )
            .await
    }

    async fn begin_withdraw_all(&self, vault_id: Uuid) -> Result<Execution, DatabaseError> {
        let new_execution = NewExecution {
            id: Uuid::new_v4(),
            strategy_id: None,
            vault_id,
            kind: ExecutionKind::WithdrawAll.as_str().to_string(),
            status: ExecutionStatus::Pending.as_str().to_string(),
        };

        self.pool
            .interact_with_context(format!("begin withdraw-all for vault {vault_id}"), move |conn| {
                Execution::create(&new_execution, conn)
            })
            .await
    }

    async fn finalize_execution(
        &self,
        id: Uuid,
        update: ExecutionOutcomeUpdate,
        transaction: Option<NewTransactionRecord>,
        strategy_status: Option<StrategyStatus>,
    ) -> Result<Execution, DatabaseError> {
        self.pool
            .interact_with_context(format!("finalize execution {id}"), move |conn| {
                Execution::finalize(id, &update, transaction.as_ref(), strategy_status, conn)
            })
            .await
    }
}
