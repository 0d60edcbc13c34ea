//! EVM access for the vault service: signing client, nonce allocation and
//! call encoding for the vault manager and its adapters.

pub mod abi;
pub mod adapters;
pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod nonce;
pub mod task;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use adapters::{AaveAdapter, PositionRange, UniswapV2Adapter, UniswapV3Adapter};
pub use client::{ChainClient, EvmClient, SentTransaction, TxOptions};
pub use config::{ChainConfig, TokenBook, parse_address};
pub use contract::{
    AdapterExecutor, AllocationTarget, ContractService, DivestLeg, InvestLeg, ReallocationPlan,
};
pub use error::ChainError;
pub use nonce::{NonceLease, NonceManager};
pub use task::NonceSyncTask;
