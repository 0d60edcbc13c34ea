//! Encoders for the protocol adapters registered in the vault manager.
//!
//! Each adapter is bound to an [`AdapterExecutor`](crate::contract::AdapterExecutor)
//! and forwards the encoded call with a zero value. Nothing is read back from
//! the chain; callers poll for the receipt themselves.

pub mod aave;
pub mod uniswap_v2;
pub mod uniswap_v3;

pub use aave::AaveAdapter;
pub use uniswap_v2::UniswapV2Adapter;
pub use uniswap_v3::{PositionRange, UniswapV3Adapter};
