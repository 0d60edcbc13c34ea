//! In-memory [`ChainClient`] that records what would have been broadcast.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256, TransactionReceipt, U64, U256};

use crate::client::{ChainClient, SentTransaction, TxOptions};
use crate::error::ChainError;

pub const MOCK_GAS_USED: u64 = 52_000;
pub const MOCK_GAS_PRICE: u64 = 2_000_000_000;
pub const MOCK_BLOCK: u64 = 1_234;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub hash: H256,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptMode {
    Success,
    Reverted,
    /// The receipt never shows up.
    Missing,
}

pub struct MockChainClient {
    address: Address,
    sent: Mutex<Vec<RecordedCall>>,
    send_error: Mutex<Option<String>>,
    receipt_mode: Mutex<ReceiptMode>,
}

impl Default for MockChainClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChainClient {
    pub fn new() -> Self {
        Self {
            address: Address::repeat_byte(0x5e),
            sent: Mutex::new(Vec::new()),
            send_error: Mutex::new(None),
            receipt_mode: Mutex::new(ReceiptMode::Success),
        }
    }

    /// Every following send fails with an RPC error carrying `message`.
    pub fn fail_sends(&self, message: &str) {
        *self.send_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn set_receipt_mode(&self, mode: ReceiptMode) {
        *self.receipt_mode.lock().unwrap() = mode;
    }

    pub fn sent(&self) -> Vec<RecordedCall> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    fn address(&self) -> Address {
        self.address
    }

    async fn transact_opts(&self) -> Result<TxOptions, ChainError> {
        Ok(TxOptions {
            nonce: U256::from(self.sent.lock().unwrap().len()),
            gas_price: U256::from(MOCK_GAS_PRICE),
            gas_limit: U256::from(crate::config::DEFAULT_MAX_GAS_LIMIT),
            chain_id: 31_337,
        })
    }

    async fn balance(&self) -> Result<U256, ChainError> {
        Ok(U256::exp10(18))
    }

    async fn token_balance(&self, token: Address) -> Result<U256, ChainError> {
        Ok(U256::from(token.to_low_u64_be() % 1_000))
    }

    async fn send_transaction(
        &self,
        to: Address,
        value: U256,
        data: Bytes,
    ) -> Result<SentTransaction, ChainError> {
        if let Some(message) = self.send_error.lock().unwrap().clone() {
            return Err(ChainError::Rpc(message));
        }

        let mut sent = self.sent.lock().unwrap();
        let nonce = sent.len() as u64;
        let hash = H256::from_low_u64_be(nonce + 1);
        sent.push(RecordedCall {
            hash,
            to,
            value,
            data,
        });

        Ok(SentTransaction {
            hash,
            from: self.address,
            to,
            value,
            nonce: U256::from(nonce),
            gas_limit: U256::from(crate::config::DEFAULT_MAX_GAS_LIMIT),
            gas_price: U256::from(MOCK_GAS_PRICE),
        })
    }

    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TransactionReceipt, ChainError> {
        let status = match *self.receipt_mode.lock().unwrap() {
            ReceiptMode::Success => 1u64,
            ReceiptMode::Reverted => 0,
            ReceiptMode::Missing => {
                return Err(ChainError::ReceiptTimeout {
                    tx_hash,
                    waited: Duration::from_secs(180),
                });
            }
        };

        Ok(TransactionReceipt {
            transaction_hash: tx_hash,
            from: self.address,
            status: Some(U64::from(status)),
            gas_used: Some(U256::from(MOCK_GAS_USED)),
            effective_gas_price: Some(U256::from(MOCK_GAS_PRICE)),
            block_number: Some(U64::from(MOCK_BLOCK)),
            ..Default::default()
        })
    }
}
