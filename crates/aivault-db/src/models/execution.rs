use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use crate::Pagination;
use crate::models::strategy::{Strategy, StrategyStatus};
use crate::models::transaction::{NewTransactionRecord, TransactionRecord};
use crate::models::vault::Vault;
use crate::schema::executions;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = executions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Execution {
    pub id: Uuid,
    pub strategy_id: Option<Uuid>,
    pub vault_id: Uuid,
    pub kind: String,
    pub status: String,
    pub tx_hash: Option<String>,
    pub gas_used: Option<i64>,
    pub gas_price: Option<BigDecimal>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = executions)]
pub struct NewExecution {
    pub id: Uuid,
    pub strategy_id: Option<Uuid>,
    pub vault_id: Uuid,
    pub kind: String,
    pub status: String,
}

/// Final state of an execution, written exactly once.
#[derive(Debug, Clone, Serialize, Deserialize, AsChangeset)]
#[diesel(table_name = executions)]
#[diesel(treat_none_as_null = true)]
pub struct ExecutionOutcomeUpdate {
    pub status: String,
    pub tx_hash: Option<String>,
    pub gas_used: Option<i64>,
    pub gas_price: Option<BigDecimal>,
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an execution submitted on-chain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExecutionKind {
    Strategy,
    WithdrawAll,
}

impl ExecutionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strategy => "strategy",
            Self::WithdrawAll => "withdraw_all",
        }
    }
}

impl fmt::Display for ExecutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An execution with the rows the HTTP layer nests inside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionDetails {
    #[serde(flatten)]
    pub execution: Execution,
    pub strategy: Option<Strategy>,
    pub vault: Vault,
    pub transactions: Vec<TransactionRecord>,
}

impl Execution {
    pub fn status(&self) -> Option<ExecutionStatus> {
        self.status.parse().ok()
    }

    pub fn find_by_id(id: Uuid, conn: &mut diesel::PgConnection) -> QueryResult<Self> {
        executions::table.find(id).first(conn)
    }

    pub fn list(pagination: Pagination, conn: &mut diesel::PgConnection) -> QueryResult<Vec<Self>> {
        executions::table
            .order(executions::created_at.desc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .load(conn)
    }

    pub fn create(
        new_execution: &NewExecution,
        conn: &mut diesel::PgConnection,
    ) -> QueryResult<Self> {
        diesel::insert_into(executions::table)
            .values(new_execution)
            .get_result(conn)
    }

    /// Claims a pending strategy and opens its execution in one transaction.
    ///
    /// Returns `None` without writing anything when the strategy is not
    /// pending anymore.
    pub fn begin_for_strategy(
        strategy_id: Uuid,
        vault_id: Uuid,
        now: DateTime<Utc>,
        conn: &mut diesel::PgConnection,
    ) -> QueryResult<Option<Self>> {
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            if Strategy::claim_for_execution(strategy_id, now, conn)?.is_none() {
                return Ok(None);
            }

            let execution = Self::create(
                &NewExecution {
                    id: Uuid::new_v4(),
                    strategy_id: Some(strategy_id),
                    vault_id,
                    kind: ExecutionKind::Strategy.as_str().to_string(),
                    status: ExecutionStatus::Pending.as_str().to_string(),
                },
                conn,
            )?;

            Ok(Some(execution))
        })
    }

    /// Writes the outcome of an execution: the execution row itself, the
    /// broadcast transaction when there was one, and the owning strategy's
    /// terminal status.
    pub fn finalize(
        id: Uuid,
        update: &ExecutionOutcomeUpdate,
        transaction: Option<&NewTransactionRecord>,
        strategy_status: Option<StrategyStatus>,
        conn: &mut diesel::PgConnection,
    ) -> QueryResult<Self> {
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let execution: Self = diesel::update(executions::table.find(id))
                .set(update)
                .get_result(conn)?;

            if let Some(transaction) = transaction {
                TransactionRecord::create(transaction, conn)?;
            }

            if let (Some(strategy_id), Some(status)) = (execution.strategy_id, strategy_status) {
                Strategy::update_status(strategy_id, status, update.updated_at, conn)?;
            }

            Ok(execution)
        })
    }

    pub fn find_details(
        id: Uuid,
        conn: &mut diesel::PgConnection,
    ) -> QueryResult<ExecutionDetails> {
        let execution = Self::find_by_id(id, conn)?;
        let mut details = Self::attach_details(vec![execution], conn)?;
        details.pop().ok_or(diesel::result::Error::NotFound)
    }

    pub fn list_details(
        pagination: Pagination,
        conn: &mut diesel::PgConnection,
    ) -> QueryResult<Vec<ExecutionDetails>> {
        let executions = Self::list(pagination, conn)?;
        Self::attach_details(executions, conn)
    }

    fn attach_details(
        executions: Vec<Self>,
        conn: &mut diesel::PgConnection,
    ) -> QueryResult<Vec<ExecutionDetails>> {
        let strategy_ids: Vec<Uuid> = executions.iter().filter_map(|e| e.strategy_id).collect();
        let vault_ids: Vec<Uuid> = executions.iter().map(|e| e.vault_id).collect();

        let strategies: HashMap<Uuid, Strategy> = Strategy::find_many(&strategy_ids, conn)?
            .into_iter()
            .map(|strategy| (strategy.id, strategy))
            .collect();
        let vaults: HashMap<Uuid, Vault> = Vault::find_many(&vault_ids, conn)?
            .into_iter()
            .map(|vault| (vault.id, vault))
            .collect();
        let transactions = TransactionRecord::grouped_for(&executions, conn)?;

        executions
            .into_iter()
            .zip(transactions)
            .map(|(execution, transactions)| {
                // vault_id is a non-null foreign key, so the vault is always there
                let vault = vaults
                    .get(&execution.vault_id)
                    .cloned()
                    .ok_or(diesel::result::Error::NotFound)?;
                let strategy = execution
                    .strategy_id
                    .and_then(|id| strategies.get(&id).cloned());

                Ok(ExecutionDetails {
                    execution,
                    strategy,
                    vault,
                    transactions,
                })
            })
            .collect()
    }
}
