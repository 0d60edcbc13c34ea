use std::str::FromStr;

use aivault_chain::SentTransaction;
use aivault_db::models::{
    ExecutionOutcomeUpdate, ExecutionStatus, NewTransactionRecord, StrategyStatus,
    TransactionStatus,
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use ethers::types::{TransactionReceipt, U256};
use uuid::Uuid;

/// How far a submission got before it stopped.
#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    /// Encoding, signing or broadcast failed. Nothing reached the chain.
    NotSent { error: String },
    /// Broadcast, but no receipt came back.
    Unconfirmed { sent: SentTransaction, error: String },
    /// Mined with status 0.
    Reverted {
        sent: SentTransaction,
        receipt: TransactionReceipt,
    },
    Confirmed {
        sent: SentTransaction,
        receipt: TransactionReceipt,
    },
}

/// Rows to write once an execution has finished.
#[derive(Debug, Clone)]
pub struct SettledExecution {
    pub update: ExecutionOutcomeUpdate,
    pub transaction: Option<NewTransactionRecord>,
    pub strategy_status: StrategyStatus,
}

pub(crate) fn to_decimal(value: U256) -> BigDecimal {
    // U256 renders as a plain base 10 integer, which always parses
    BigDecimal::from_str(&value.to_string()).unwrap_or_default()
}

/// `None` when the value does not fit a BIGINT column.
fn to_bigint(value: U256) -> Option<i64> {
    if value > U256::from(i64::MAX as u64) {
        return None;
    }
    Some(value.as_u64() as i64)
}

pub(crate) fn hex_string<T: std::fmt::LowerHex>(value: T) -> String {
    format!("{value:#x}")
}

impl SubmissionOutcome {
    pub fn from_receipt(sent: SentTransaction, receipt: TransactionReceipt) -> Self {
        if receipt.status.is_some_and(|status| status.as_u64() == 1) {
            Self::Confirmed { sent, receipt }
        } else {
            Self::Reverted { sent, receipt }
        }
    }

    pub const fn succeeded(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }

    pub fn sent(&self) -> Option<&SentTransaction> {
        match self {
            Self::NotSent { .. } => None,
            Self::Unconfirmed { sent, .. }
            | Self::Reverted { sent, .. }
            | Self::Confirmed { sent, .. } => Some(sent),
        }
    }

    pub fn error(&self) -> Option<String> {
        match self {
            Self::NotSent { error } | Self::Unconfirmed { error, .. } => Some(error.clone()),
            Self::Reverted { receipt, .. } => Some(format!(
                "transaction {} reverted in block {}",
                hex_string(receipt.transaction_hash),
                receipt
                    .block_number
                    .map_or_else(|| "unknown".to_string(), |block| block.to_string())
            )),
            Self::Confirmed { .. } => None,
        }
    }

    fn receipt(&self) -> Option<&TransactionReceipt> {
        match self {
            Self::Reverted { receipt, .. } | Self::Confirmed { receipt, .. } => Some(receipt),
            Self::NotSent { .. } | Self::Unconfirmed { .. } => None,
        }
    }

    /// Maps the outcome to the final execution row and, when something was
    /// broadcast, the transaction row.
    ///
    /// `tx_hash` is set only for broadcast transactions and the gas fields
    /// only when a receipt was seen.
    pub fn settle(&self, execution_id: Uuid, now: DateTime<Utc>) -> SettledExecution {
        let succeeded = self.succeeded();
        let receipt = self.receipt();
        let gas_used = receipt.and_then(|r| r.gas_used).and_then(to_bigint);
        // both gas fields come from the same receipt, or neither is set
        let gas_price = gas_used.and(receipt).map(|r| {
            to_decimal(
                r.effective_gas_price
                    .or_else(|| self.sent().map(|sent| sent.gas_price))
                    .unwrap_or_default(),
            )
        });

        let transaction = self.sent().map(|sent| NewTransactionRecord {
            id: Uuid::new_v4(),
            execution_id,
            tx_hash: hex_string(sent.hash),
            from_address: hex_string(sent.from),
            to_address: hex_string(sent.to),
            value: to_decimal(sent.value),
            gas_used,
            gas_price: gas_price.clone(),
            status: match self {
                Self::Confirmed { .. } => TransactionStatus::Confirmed,
                Self::Reverted { .. } => TransactionStatus::Failed,
                _ => TransactionStatus::Pending,
            }
            .as_str()
            .to_string(),
            block_number: receipt
                .and_then(|r| r.block_number)
                .and_then(|block| i64::try_from(block.as_u64()).ok()),
        });

        let status = if succeeded {
            ExecutionStatus::Completed
        } else {
            ExecutionStatus::Failed
        };

        SettledExecution {
            update: ExecutionOutcomeUpdate {
                status: status.as_str().to_string(),
                tx_hash: transaction.as_ref().map(|tx| tx.tx_hash.clone()),
                gas_used,
                gas_price,
                error: self.error(),
                updated_at: now,
                completed_at: Some(now),
            },
            transaction,
            strategy_status: if succeeded {
                StrategyStatus::Completed
            } else {
                StrategyStatus::Failed
            },
        }
    }
}
