pub mod adapters;
pub mod allocations;
pub mod executions;
pub mod health;
pub mod strategies;
pub mod vaults;

pub use adapters::{
    configure_aave, configure_uniswap_v2, configure_uniswap_v3, update_uniswap_v2_config,
    update_uniswap_v2_slippage, update_uniswap_v3_config, update_uniswap_v3_slippage,
};
pub use allocations::{get_account, partial_update_allocations, update_allocations, withdraw};
pub use executions::{get_execution, list_executions};
pub use health::health;
pub use strategies::{create_strategy, execute_strategy, get_strategy, list_strategies};
pub use vaults::{get_vault, list_vaults, register_vault, withdraw_all_investments};
