use aivault_strategy::AccountSnapshot;
use ethers::types::H256;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AllocationTargetRequest {
    pub adapter_index: i64,
    /// Tenths of a percent, 0 to 1000
    pub percentage: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateAllocationsRequest {
    /// Token address or configured symbol
    pub token_address: String,
    pub allocations: Vec<AllocationTargetRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DivestRequest {
    pub adapter_index: i64,
    /// uint256 as a decimal string
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvestRequest {
    pub adapter_index: i64,
    /// uint256 as a decimal string
    pub amount: String,
    pub allocation: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PartialUpdateRequest {
    pub token_address: String,
    #[serde(default)]
    pub divest: Vec<DivestRequest>,
    #[serde(default)]
    pub invest: Vec<InvestRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WithdrawRequest {
    pub token_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AaveConfigureRequest {
    pub adapter_index: i64,
    pub token_address: String,
    pub vault_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UniswapV2ConfigureRequest {
    pub adapter_index: i64,
    pub token_address: String,
    /// Basis points, at most 10000
    pub slippage_tolerance: i64,
    pub counter_party_token: String,
    pub vault_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SlippageRequest {
    pub adapter_index: i64,
    pub token_address: String,
    /// Basis points, at most 10000
    pub slippage_tolerance: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UniswapV2UpdateRequest {
    pub adapter_index: i64,
    pub token_address: String,
    pub counter_party_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UniswapV3ConfigureRequest {
    pub adapter_index: i64,
    pub token_address: String,
    pub counter_party_token: String,
    pub slippage_tolerance: i64,
    /// Pool fee in hundredths of a bip (uint24)
    pub fee_tier: i64,
    pub tick_lower: i64,
    pub tick_upper: i64,
    pub vault_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UniswapV3UpdateRequest {
    pub adapter_index: i64,
    pub token_address: String,
    pub counter_party_token: String,
    pub fee_tier: i64,
    pub tick_lower: i64,
    pub tick_upper: i64,
}

/// A broadcast transaction whose receipt has not been awaited.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmittedTransaction {
    pub tx_hash: String,
    pub status: String,
}

impl SubmittedTransaction {
    pub fn pending(tx_hash: H256) -> Self {
        Self {
            tx_hash: format!("{tx_hash:#x}"),
            status: "pending".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenBalanceDto {
    pub symbol: String,
    pub address: String,
    pub balance: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TxOptionsDto {
    pub nonce: String,
    pub gas_price: String,
    pub gas_limit: String,
    pub chain_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub address: String,
    /// Native balance in wei
    pub balance: String,
    pub tokens: Vec<TokenBalanceDto>,
    pub next_transaction: TxOptionsDto,
}

impl From<AccountSnapshot> for AccountResponse {
    fn from(account: AccountSnapshot) -> Self {
        Self {
            address: format!("{:#x}", account.address),
            balance: account.balance.to_string(),
            tokens: account
                .tokens
                .into_iter()
                .map(|token| TokenBalanceDto {
                    symbol: token.symbol,
                    address: format!("{:#x}", token.address),
                    balance: token.balance.to_string(),
                })
                .collect(),
            next_transaction: TxOptionsDto {
                nonce: account.next_transaction.nonce.to_string(),
                gas_price: account.next_transaction.gas_price.to_string(),
                gas_limit: account.next_transaction.gas_limit.to_string(),
                chain_id: account.next_transaction.chain_id,
            },
        }
    }
}
