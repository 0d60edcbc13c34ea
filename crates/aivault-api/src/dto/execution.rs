use aivault_db::models::{Execution, ExecutionDetails, TransactionRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::{StrategySummary, VaultDto};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionDto {
    pub id: Uuid,
    pub tx_hash: String,
    pub from_address: String,
    pub to_address: String,
    pub value: String,
    pub gas_used: Option<i64>,
    pub gas_price: Option<String>,
    pub status: String,
    pub block_number: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<TransactionRecord> for TransactionDto {
    fn from(tx: TransactionRecord) -> Self {
        Self {
            id: tx.id,
            tx_hash: tx.tx_hash,
            from_address: tx.from_address,
            to_address: tx.to_address,
            value: tx.value.to_string(),
            gas_used: tx.gas_used,
            gas_price: tx.gas_price.map(|price| price.to_string()),
            status: tx.status,
            block_number: tx.block_number,
            created_at: tx.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExecutionDto {
    pub id: Uuid,
    /// `strategy` or `withdraw_all`
    pub kind: String,
    pub strategy_id: Option<Uuid>,
    pub vault_id: Uuid,
    pub status: String,
    pub tx_hash: Option<String>,
    pub gas_used: Option<i64>,
    pub gas_price: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault: Option<VaultDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<TransactionDto>>,
}

impl From<Execution> for ExecutionDto {
    fn from(execution: Execution) -> Self {
        Self {
            id: execution.id,
            kind: execution.kind,
            strategy_id: execution.strategy_id,
            vault_id: execution.vault_id,
            status: execution.status,
            tx_hash: execution.tx_hash,
            gas_used: execution.gas_used,
            gas_price: execution.gas_price.map(|price| price.to_string()),
            error: execution.error,
            created_at: execution.created_at,
            updated_at: execution.updated_at,
            completed_at: execution.completed_at,
            strategy: None,
            vault: None,
            transactions: None,
        }
    }
}

impl From<ExecutionDetails> for ExecutionDto {
    fn from(details: ExecutionDetails) -> Self {
        Self {
            strategy: details.strategy.map(Into::into),
            vault: Some(details.vault.into()),
            transactions: Some(details.transactions.into_iter().map(Into::into).collect()),
            ..details.execution.into()
        }
    }
}
