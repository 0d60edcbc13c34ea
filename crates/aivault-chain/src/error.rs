use std::fmt::Display;
use std::time::Duration;

use ethers::types::H256;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("RPC request failed: {0}")]
    Rpc(String),
    #[error("Failed to sign transaction: {0}")]
    Signing(String),
    #[error("ABI encoding failed: {0}")]
    Abi(String),
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("No receipt for {tx_hash:?} after {waited:?}")]
    ReceiptTimeout { tx_hash: H256, waited: Duration },
    #[error("Invalid chain configuration: {0}")]
    Config(String),
}

impl ChainError {
    pub fn rpc(err: impl Display) -> Self {
        Self::Rpc(err.to_string())
    }

    pub fn abi(err: impl Display) -> Self {
        Self::Abi(err.to_string())
    }
}
