use std::sync::Arc;

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::{Address, Bytes, H256, TransactionReceipt, U256};
use tracing::info;

use crate::abi::{self, vault_manager};
use crate::client::{ChainClient, SentTransaction};
use crate::error::ChainError;

/// Target share of one adapter in a full reallocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationTarget {
    pub adapter_index: U256,
    pub allocation: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DivestLeg {
    pub adapter_index: U256,
    pub amount: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvestLeg {
    pub adapter_index: U256,
    pub amount: U256,
    pub allocation: U256,
}

/// Moves funds out of some adapters and into others without touching the
/// rest of the holding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReallocationPlan {
    pub divest: Vec<DivestLeg>,
    pub invest: Vec<InvestLeg>,
}

pub fn update_holding_allocation_calldata(
    token: Address,
    targets: &[AllocationTarget],
) -> Result<Bytes, ChainError> {
    if targets.is_empty() {
        return Err(ChainError::InvalidArgument(
            "at least one allocation is required".to_string(),
        ));
    }

    vault_manager::UPDATE_HOLDING_ALLOCATION.encode(&[
        abi::address(token),
        abi::uint_array(targets.iter().map(|t| t.adapter_index)),
        abi::uint_array(targets.iter().map(|t| t.allocation)),
    ])
}

pub fn partial_update_holding_allocation_calldata(
    token: Address,
    plan: &ReallocationPlan,
) -> Result<Bytes, ChainError> {
    if plan.divest.is_empty() && plan.invest.is_empty() {
        return Err(ChainError::InvalidArgument(
            "reallocation plan is empty".to_string(),
        ));
    }

    vault_manager::PARTIAL_UPDATE_HOLDING_ALLOCATION.encode(&[
        abi::address(token),
        abi::uint_array(plan.divest.iter().map(|leg| leg.adapter_index)),
        abi::uint_array(plan.divest.iter().map(|leg| leg.amount)),
        abi::uint_array(plan.invest.iter().map(|leg| leg.adapter_index)),
        abi::uint_array(plan.invest.iter().map(|leg| leg.amount)),
        abi::uint_array(plan.invest.iter().map(|leg| leg.allocation)),
    ])
}

pub fn withdraw_all_investments_calldata(token: Address) -> Result<Bytes, ChainError> {
    vault_manager::WITHDRAW_ALL_INVESTMENTS.encode(&[abi::address(token)])
}

pub fn execute_calldata(adapter_index: U256, value: U256, data: &Bytes) -> Result<Bytes, ChainError> {
    vault_manager::EXECUTE.encode(&[
        abi::uint(adapter_index),
        abi::uint(value),
        Token::Bytes(data.to_vec()),
    ])
}

/// Forwards an adapter call through the vault manager.
#[async_trait]
pub trait AdapterExecutor: Send + Sync {
    async fn execute(&self, adapter_index: U256, value: U256, data: Bytes)
    -> Result<H256, ChainError>;
}

/// Submits vault manager calls from the service's signing key.
pub struct ContractService {
    client: Arc<dyn ChainClient>,
    vault_manager: Address,
}

impl ContractService {
    pub fn new(client: Arc<dyn ChainClient>, vault_manager: Address) -> Self {
        Self {
            client,
            vault_manager,
        }
    }

    pub const fn vault_manager(&self) -> Address {
        self.vault_manager
    }

    pub fn client(&self) -> &Arc<dyn ChainClient> {
        &self.client
    }

    async fn submit(&self, operation: &str, data: Bytes) -> Result<SentTransaction, ChainError> {
        let sent = self
            .client
            .send_transaction(self.vault_manager, U256::zero(), data)
            .await?;
        info!(operation, tx_hash = ?sent.hash, "Vault manager call submitted");
        Ok(sent)
    }

    pub async fn update_holding_allocation(
        &self,
        token: Address,
        targets: &[AllocationTarget],
    ) -> Result<SentTransaction, ChainError> {
        let data = update_holding_allocation_calldata(token, targets)?;
        self.submit(vault_manager::UPDATE_HOLDING_ALLOCATION.name(), data)
            .await
    }

    pub async fn partial_update_holding_allocation(
        &self,
        token: Address,
        plan: &ReallocationPlan,
    ) -> Result<SentTransaction, ChainError> {
        let data = partial_update_holding_allocation_calldata(token, plan)?;
        self.submit(vault_manager::PARTIAL_UPDATE_HOLDING_ALLOCATION.name(), data)
            .await
    }

    pub async fn withdraw_all_investments(
        &self,
        token: Address,
    ) -> Result<SentTransaction, ChainError> {
        let data = withdraw_all_investments_calldata(token)?;
        self.submit(vault_manager::WITHDRAW_ALL_INVESTMENTS.name(), data)
            .await
    }

    /// Generic passthrough used by the adapter encoders.
    pub async fn execute_adapter_call(
        &self,
        adapter_index: U256,
        value: U256,
        data: Bytes,
    ) -> Result<SentTransaction, ChainError> {
        let calldata = execute_calldata(adapter_index, value, &data)?;
        self.submit(vault_manager::EXECUTE.name(), calldata).await
    }

    pub async fn wait_for_transaction(
        &self,
        tx_hash: H256,
    ) -> Result<TransactionReceipt, ChainError> {
        self.client.wait_for_receipt(tx_hash).await
    }
}

#[async_trait]
impl AdapterExecutor for ContractService {
    async fn execute(
        &self,
        adapter_index: U256,
        value: U256,
        data: Bytes,
    ) -> Result<H256, ChainError> {
        self.execute_adapter_call(adapter_index, value, data)
            .await
            .map(|sent| sent.hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockChainClient;

    fn token() -> Address {
        Address::repeat_byte(0xaa)
    }

    #[tokio::test]
    async fn test_update_holding_allocation_targets_vault_manager() {
        let client = Arc::new(MockChainClient::new());
        let manager = Address::repeat_byte(0x42);
        let service = ContractService::new(client.clone(), manager);

        let targets = [
            AllocationTarget {
                adapter_index: U256::from(0),
                allocation: U256::from(700),
            },
            AllocationTarget {
                adapter_index: U256::from(1),
                allocation: U256::from(300),
            },
        ];
        let sent = service
            .update_holding_allocation(token(), &targets)
            .await
            .unwrap();

        let calls = client.sent();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].to, manager);
        assert_eq!(calls[0].value, U256::zero());
        assert_eq!(sent.hash, calls[0].hash);

        let args = vault_manager::UPDATE_HOLDING_ALLOCATION
            .decode(&calls[0].data)
            .unwrap();
        assert_eq!(args[0], Token::Address(token()));
        assert_eq!(
            args[2],
            Token::Array(vec![
                Token::Uint(U256::from(700)),
                Token::Uint(U256::from(300))
            ])
        );
    }

    #[tokio::test]
    async fn test_empty_allocations_are_rejected_before_sending() {
        let client = Arc::new(MockChainClient::new());
        let service = ContractService::new(client.clone(), Address::repeat_byte(0x42));

        let result = service.update_holding_allocation(token(), &[]).await;

        assert!(matches!(result, Err(ChainError::InvalidArgument(_))));
        assert!(client.sent().is_empty());
    }

    #[test]
    fn test_partial_update_keeps_leg_order() {
        let plan = ReallocationPlan {
            divest: vec![DivestLeg {
                adapter_index: U256::from(2),
                amount: U256::from(1_000),
            }],
            invest: vec![
                InvestLeg {
                    adapter_index: U256::from(0),
                    amount: U256::from(600),
                    allocation: U256::from(600),
                },
                InvestLeg {
                    adapter_index: U256::from(1),
                    amount: U256::from(400),
                    allocation: U256::from(400),
                },
            ],
        };

        let calldata = partial_update_holding_allocation_calldata(token(), &plan).unwrap();
        let args = vault_manager::PARTIAL_UPDATE_HOLDING_ALLOCATION
            .decode(&calldata)
            .unwrap();

        assert_eq!(args.len(), 6);
        assert_eq!(args[1], Token::Array(vec![Token::Uint(U256::from(2))]));
        assert_eq!(
            args[3],
            Token::Array(vec![Token::Uint(U256::from(0)), Token::Uint(U256::from(1))])
        );
        assert!(
            partial_update_holding_allocation_calldata(token(), &ReallocationPlan::default())
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_adapter_calls_wrap_inner_data_in_execute() {
        let client = Arc::new(MockChainClient::new());
        let service = ContractService::new(client.clone(), Address::repeat_byte(0x42));
        let inner = withdraw_all_investments_calldata(token()).unwrap();

        AdapterExecutor::execute(&service, U256::from(4), U256::zero(), inner.clone())
            .await
            .unwrap();

        let calls = client.sent();
        let args = vault_manager::EXECUTE.decode(&calls[0].data).unwrap();
        assert_eq!(args[0], Token::Uint(U256::from(4)));
        assert_eq!(args[1], Token::Uint(U256::zero()));
        assert_eq!(args[2], Token::Bytes(inner.to_vec()));
    }
}
