use std::sync::Arc;

use aivault_chain::{
    AaveAdapter, AdapterExecutor, AllocationTarget, ContractService, PositionRange,
    ReallocationPlan, TokenBook, TxOptions, UniswapV2Adapter, UniswapV3Adapter,
};
use aivault_metrics::MetricsRegistry;
use ethers::types::{Address, H256, U256};
use tracing::{info, instrument};

use crate::error::ServiceError;

/// Slippage tolerances are basis points, so 100% is the ceiling.
pub const MAX_SLIPPAGE_BPS: u32 = 10_000;

#[derive(Debug, Clone)]
pub struct TokenBalance {
    pub symbol: String,
    pub address: Address,
    pub balance: U256,
}

#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    pub address: Address,
    pub balance: U256,
    pub tokens: Vec<TokenBalance>,
    pub next_transaction: TxOptions,
}

/// Direct vault manager and adapter calls. Each one returns as soon as the
/// transaction is broadcast.
#[derive(Clone)]
pub struct VaultOperations {
    contracts: Arc<ContractService>,
    aave: Arc<AaveAdapter>,
    uniswap_v2: Arc<UniswapV2Adapter>,
    uniswap_v3: Arc<UniswapV3Adapter>,
    tokens: TokenBook,
    metrics: Arc<MetricsRegistry>,
}

fn check_slippage(slippage_bps: u32) -> Result<U256, ServiceError> {
    if slippage_bps > MAX_SLIPPAGE_BPS {
        return Err(ServiceError::InvalidRequest(format!(
            "slippage_tolerance must be at most {MAX_SLIPPAGE_BPS} bps, got {slippage_bps}"
        )));
    }
    Ok(U256::from(slippage_bps))
}

impl VaultOperations {
    pub fn new(
        contracts: Arc<ContractService>,
        tokens: TokenBook,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        let executor: Arc<dyn AdapterExecutor> = contracts.clone();
        Self {
            aave: Arc::new(AaveAdapter::new(executor.clone())),
            uniswap_v2: Arc::new(UniswapV2Adapter::new(executor.clone())),
            uniswap_v3: Arc::new(UniswapV3Adapter::new(executor)),
            contracts,
            tokens,
            metrics,
        }
    }

    /// Accepts a hex address or a configured token symbol.
    pub fn resolve_token(&self, input: &str) -> Result<Address, ServiceError> {
        Ok(self.tokens.resolve(input)?)
    }

    fn submitted(&self, operation: &str, tx_hash: H256) -> H256 {
        self.metrics.transactions.record_submitted(operation);
        info!(operation, tx_hash = ?tx_hash, "Transaction submitted");
        tx_hash
    }

    #[instrument(skip(self, targets), fields(count = targets.len()))]
    pub async fn update_allocations(
        &self,
        token: Address,
        targets: &[AllocationTarget],
    ) -> Result<H256, ServiceError> {
        let sent = self
            .contracts
            .update_holding_allocation(token, targets)
            .await?;
        Ok(self.submitted("update_holding_allocation", sent.hash))
    }

    #[instrument(skip(self, plan))]
    pub async fn partial_update_allocations(
        &self,
        token: Address,
        plan: &ReallocationPlan,
    ) -> Result<H256, ServiceError> {
        let sent = self
            .contracts
            .partial_update_holding_allocation(token, plan)
            .await?;
        Ok(self.submitted("partial_update_holding_allocation", sent.hash))
    }

    #[instrument(skip(self))]
    pub async fn withdraw_all(&self, token: Address) -> Result<H256, ServiceError> {
        let sent = self.contracts.withdraw_all_investments(token).await?;
        Ok(self.submitted("withdraw_all_investments", sent.hash))
    }

    #[instrument(skip(self))]
    pub async fn configure_aave(
        &self,
        adapter_index: u32,
        token: Address,
        vault: Address,
    ) -> Result<H256, ServiceError> {
        let hash = self
            .aave
            .set_token_vault(U256::from(adapter_index), token, vault)
            .await?;
        Ok(self.submitted("aave_set_token_vault", hash))
    }

    #[instrument(skip(self))]
    pub async fn configure_uniswap_v2(
        &self,
        adapter_index: u32,
        token: Address,
        slippage_bps: u32,
        counter_party_token: Address,
        vault: Address,
    ) -> Result<H256, ServiceError> {
        let slippage = check_slippage(slippage_bps)?;
        let hash = self
            .uniswap_v2
            .set_token_config(
                U256::from(adapter_index),
                token,
                slippage,
                counter_party_token,
                vault,
            )
            .await?;
        Ok(self.submitted("uniswap_v2_set_token_config", hash))
    }

    #[instrument(skip(self))]
    pub async fn update_uniswap_v2_slippage(
        &self,
        adapter_index: u32,
        token: Address,
        slippage_bps: u32,
    ) -> Result<H256, ServiceError> {
        let slippage = check_slippage(slippage_bps)?;
        let hash = self
            .uniswap_v2
            .update_slippage_tolerance(U256::from(adapter_index), token, slippage)
            .await?;
        Ok(self.submitted("uniswap_v2_update_slippage", hash))
    }

    #[instrument(skip(self))]
    pub async fn update_uniswap_v2_config(
        &self,
        adapter_index: u32,
        token: Address,
        counter_party_token: Address,
    ) -> Result<H256, ServiceError> {
        let hash = self
            .uniswap_v2
            .update_token_config(U256::from(adapter_index), token, counter_party_token)
            .await?;
        Ok(self.submitted("uniswap_v2_update_token_config", hash))
    }

    #[instrument(skip(self))]
    pub async fn configure_uniswap_v3(
        &self,
        adapter_index: u32,
        token: Address,
        counter_party_token: Address,
        slippage_bps: u32,
        range: PositionRange,
        vault: Address,
    ) -> Result<H256, ServiceError> {
        let slippage = check_slippage(slippage_bps)?;
        let hash = self
            .uniswap_v3
            .set_token_config(
                U256::from(adapter_index),
                token,
                counter_party_token,
                slippage,
                range,
                vault,
            )
            .await?;
        Ok(self.submitted("uniswap_v3_set_token_config", hash))
    }

    #[instrument(skip(self))]
    pub async fn update_uniswap_v3_slippage(
        &self,
        adapter_index: u32,
        token: Address,
        slippage_bps: u32,
    ) -> Result<H256, ServiceError> {
        let slippage = check_slippage(slippage_bps)?;
        let hash = self
            .uniswap_v3
            .update_slippage_tolerance(U256::from(adapter_index), token, slippage)
            .await?;
        Ok(self.submitted("uniswap_v3_update_slippage", hash))
    }

    #[instrument(skip(self))]
    pub async fn update_uniswap_v3_config(
        &self,
        adapter_index: u32,
        token: Address,
        counter_party_token: Address,
        range: PositionRange,
    ) -> Result<H256, ServiceError> {
        let hash = self
            .uniswap_v3
            .update_token_config(U256::from(adapter_index), token, counter_party_token, range)
            .await?;
        Ok(self.submitted("uniswap_v3_update_token_config", hash))
    }

    /// Signer address, balances and the options the next send would use.
    pub async fn account(&self) -> Result<AccountSnapshot, ServiceError> {
        let client = self.contracts.client();

        let mut tokens = Vec::new();
        for (symbol, address) in self.tokens.iter() {
            tokens.push(TokenBalance {
                symbol: symbol.to_string(),
                address,
                balance: client.token_balance(address).await?,
            });
        }

        Ok(AccountSnapshot {
            address: client.address(),
            balance: client.balance().await?,
            tokens,
            next_transaction: client.transact_opts().await?,
        })
    }
}
