//! In-memory [`StrategyRepository`] mirroring the Postgres semantics the
//! services rely on: conditional claim, unique vault address, atomic
//! finalize.

use std::sync::Mutex;

use aivault_db::models::{
    Allocation, Execution, ExecutionDetails, ExecutionKind, ExecutionOutcomeUpdate,
    ExecutionStatus, NewAllocation, NewStrategy, NewTransactionRecord, NewVault, Strategy,
    StrategyStatus, StrategyWithAllocations, TransactionRecord, Vault,
};
use aivault_db::{DatabaseError, Pagination};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::repository::StrategyRepository;

#[derive(Default)]
struct State {
    strategies: Vec<StrategyWithAllocations>,
    vaults: Vec<Vault>,
    executions: Vec<Execution>,
    transactions: Vec<TransactionRecord>,
    failing_finalizes: usize,
}

#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<State>,
}

fn window<T: Clone>(rows: &[T], pagination: Pagination) -> Vec<T> {
    rows.iter()
        .rev()
        .skip(pagination.offset as usize)
        .take(pagination.limit as usize)
        .cloned()
        .collect()
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `count` finalize calls fail with a query error.
    pub fn fail_next_finalizes(&self, count: usize) {
        self.state.lock().unwrap().failing_finalizes = count;
    }

    pub fn strategy(&self, id: Uuid) -> Option<Strategy> {
        let state = self.state.lock().unwrap();
        state
            .strategies
            .iter()
            .find(|s| s.strategy.id == id)
            .map(|s| s.strategy.clone())
    }

    pub fn executions(&self) -> Vec<Execution> {
        self.state.lock().unwrap().executions.clone()
    }

    pub fn transactions(&self) -> Vec<TransactionRecord> {
        self.state.lock().unwrap().transactions.clone()
    }

    fn details(state: &State, execution: &Execution) -> Result<ExecutionDetails, DatabaseError> {
        let vault = state
            .vaults
            .iter()
            .find(|v| v.id == execution.vault_id)
            .cloned()
            .ok_or_else(|| DatabaseError::not_found(format!("vault {}", execution.vault_id)))?;
        let strategy = execution.strategy_id.and_then(|id| {
            state
                .strategies
                .iter()
                .find(|s| s.strategy.id == id)
                .map(|s| s.strategy.clone())
        });
        let transactions = state
            .transactions
            .iter()
            .filter(|t| t.execution_id == execution.id)
            .cloned()
            .collect();

        Ok(ExecutionDetails {
            execution: execution.clone(),
            strategy,
            vault,
            transactions,
        })
    }

    fn insert_execution(
        state: &mut State,
        strategy_id: Option<Uuid>,
        vault_id: Uuid,
        kind: ExecutionKind,
        now: DateTime<Utc>,
    ) -> Execution {
        let execution = Execution {
            id: Uuid::new_v4(),
            strategy_id,
            vault_id,
            kind: kind.as_str().to_string(),
            status: ExecutionStatus::Pending.as_str().to_string(),
            tx_hash: None,
            gas_used: None,
            gas_price: None,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        state.executions.push(execution.clone());
        execution
    }
}

#[async_trait]
impl StrategyRepository for InMemoryRepository {
    async fn create_strategy(
        &self,
        strategy: NewStrategy,
        allocations: Vec<NewAllocation>,
    ) -> Result<StrategyWithAllocations, DatabaseError> {
        let now = Utc::now();
        let created = StrategyWithAllocations {
            strategy: Strategy {
                id: strategy.id,
                name: strategy.name,
                description: strategy.description,
                status: strategy.status,
                created_at: now,
                updated_at: now,
                executed_at: None,
            },
            allocations: allocations
                .into_iter()
                .map(|a| Allocation {
                    id: a.id,
                    strategy_id: a.strategy_id,
                    position: a.position,
                    adapter_index: a.adapter_index,
                    percentage: a.percentage,
                    protocol: a.protocol,
                    created_at: now,
                })
                .collect(),
        };

        self.state.lock().unwrap().strategies.push(created.clone());
        Ok(created)
    }

    async fn find_strategy(&self, id: Uuid) -> Result<StrategyWithAllocations, DatabaseError> {
        let state = self.state.lock().unwrap();
        state
            .strategies
            .iter()
            .find(|s| s.strategy.id == id)
            .cloned()
            .ok_or_else(|| DatabaseError::not_found(format!("strategy {id}")))
    }

    async fn list_strategies(
        &self,
        pagination: Pagination,
    ) -> Result<Vec<StrategyWithAllocations>, DatabaseError> {
        Ok(window(&self.state.lock().unwrap().strategies, pagination))
    }

    async fn create_vault(&self, vault: NewVault) -> Result<Vault, DatabaseError> {
        let mut state = self.state.lock().unwrap();
        if state.vaults.iter().any(|v| v.address == vault.address) {
            return Err(DatabaseError::UniqueViolation {
                operation: format!("register vault {}", vault.address),
                message: "duplicate key value violates unique constraint \"vaults_address_key\""
                    .to_string(),
            });
        }

        let now = Utc::now();
        let created = Vault {
            id: vault.id,
            address: vault.address,
            token_address: vault.token_address,
            token_symbol: vault.token_symbol,
            token_name: vault.token_name,
            is_active: vault.is_active,
            total_assets: vault.total_assets,
            created_at: now,
            updated_at: now,
        };
        state.vaults.push(created.clone());
        Ok(created)
    }

    async fn find_vault(&self, id: Uuid) -> Result<Vault, DatabaseError> {
        let state = self.state.lock().unwrap();
        state
            .vaults
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or_else(|| DatabaseError::not_found(format!("vault {id}")))
    }

    async fn list_vaults(&self, pagination: Pagination) -> Result<Vec<Vault>, DatabaseError> {
        Ok(window(&self.state.lock().unwrap().vaults, pagination))
    }

    async fn find_execution(&self, id: Uuid) -> Result<ExecutionDetails, DatabaseError> {
        let state = self.state.lock().unwrap();
        let execution = state
            .executions
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| DatabaseError::not_found(format!("execution {id}")))?;
        Self::details(&state, execution)
    }

    async fn list_executions(
        &self,
        pagination: Pagination,
    ) -> Result<Vec<ExecutionDetails>, DatabaseError> {
        let state = self.state.lock().unwrap();
        window(&state.executions, pagination)
            .iter()
            .map(|execution| Self::details(&state, execution))
            .collect()
    }

    async fn begin_strategy_execution(
        &self,
        strategy_id: Uuid,
        vault_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Execution>, DatabaseError> {
        let mut state = self.state.lock().unwrap();
        let Some(entry) = state
            .strategies
            .iter_mut()
            .find(|s| s.strategy.id == strategy_id)
        else {
            return Ok(None);
        };
        if entry.strategy.status != StrategyStatus::Pending.as_str() {
            return Ok(None);
        }

        entry.strategy.status = StrategyStatus::Executing.as_str().to_string();
        entry.strategy.executed_at = Some(now);
        entry.strategy.updated_at = now;

        Ok(Some(Self::insert_execution(
            &mut state,
            Some(strategy_id),
            vault_id,
            ExecutionKind::Strategy,
            now,
        )))
    }

    async fn begin_withdraw_all(&self, vault_id: Uuid) -> Result<Execution, DatabaseError> {
        let mut state = self.state.lock().unwrap();
        Ok(Self::insert_execution(
            &mut state,
            None,
            vault_id,
            ExecutionKind::WithdrawAll,
            Utc::now(),
        ))
    }

    async fn finalize_execution(
        &self,
        id: Uuid,
        update: ExecutionOutcomeUpdate,
        transaction: Option<NewTransactionRecord>,
        strategy_status: Option<StrategyStatus>,
    ) -> Result<Execution, DatabaseError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_finalizes > 0 {
            state.failing_finalizes -= 1;
            return Err(DatabaseError::QueryError {
                operation: format!("finalize execution {id}"),
                message: "connection reset".to_string(),
            });
        }

        let execution = state
            .executions
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| DatabaseError::not_found(format!("finalize execution {id}")))?;

        execution.status = update.status;
        execution.tx_hash = update.tx_hash;
        execution.gas_used = update.gas_used;
        execution.gas_price = update.gas_price;
        execution.error = update.error;
        execution.updated_at = update.updated_at;
        execution.completed_at = update.completed_at;
        let execution = execution.clone();

        if let Some(tx) = transaction {
            state.transactions.push(TransactionRecord {
                id: tx.id,
                execution_id: tx.execution_id,
                tx_hash: tx.tx_hash,
                from_address: tx.from_address,
                to_address: tx.to_address,
                value: tx.value,
                gas_used: tx.gas_used,
                gas_price: tx.gas_price,
                status: tx.status,
                block_number: tx.block_number,
                created_at: update.updated_at,
            });
        }

        if let (Some(strategy_id), Some(status)) = (execution.strategy_id, strategy_status)
            && let Some(entry) = state
                .strategies
                .iter_mut()
                .find(|s| s.strategy.id == strategy_id)
        {
            entry.strategy.status = status.as_str().to_string();
            entry.strategy.updated_at = update.updated_at;
        }

        Ok(execution)
    }
}
