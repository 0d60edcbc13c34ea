use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use aivault_chain::{
    AllocationTarget, ChainError, ContractService, SentTransaction, parse_address,
};
use aivault_db::models::{
    Execution, ExecutionDetails, ExecutionKind, ExecutionOutcomeUpdate, ExecutionStatus,
    NewAllocation, NewStrategy, NewVault, StrategyStatus, StrategyWithAllocations, Vault,
};
use aivault_db::{DatabaseError, Pagination};
use aivault_metrics::{ExecutionKindLabel, MetricsRegistry};
use bigdecimal::BigDecimal;
use chrono::Utc;
use ethers::types::{Address, U256};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::error::ServiceError;
use crate::outcome::{SubmissionOutcome, hex_string};
use crate::repository::StrategyRepository;

#[derive(Debug, Clone)]
pub struct AllocationDraft {
    pub adapter_index: u32,
    pub percentage: u16,
    pub protocol: String,
}

#[derive(Debug, Clone)]
pub struct StrategyDraft {
    pub name: String,
    pub description: Option<String>,
    pub allocations: Vec<AllocationDraft>,
}

#[derive(Debug, Clone)]
pub struct VaultRegistration {
    pub address: Address,
    pub token_address: Address,
    pub token_symbol: String,
    pub token_name: String,
    pub total_assets: BigDecimal,
}

/// Strategy bookkeeping and the submit, wait, persist pipeline.
#[derive(Clone)]
pub struct StrategyService {
    repository: Arc<dyn StrategyRepository>,
    contracts: Arc<ContractService>,
    metrics: Arc<MetricsRegistry>,
}

impl StrategyService {
    pub fn new(
        repository: Arc<dyn StrategyRepository>,
        contracts: Arc<ContractService>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            repository,
            contracts,
            metrics,
        }
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create_strategy(
        &self,
        draft: StrategyDraft,
    ) -> Result<StrategyWithAllocations, ServiceError> {
        let strategy_id = Uuid::new_v4();
        let strategy = NewStrategy {
            id: strategy_id,
            name: draft.name,
            description: draft.description,
            status: StrategyStatus::Pending.as_str().to_string(),
        };
        let allocations = draft
            .allocations
            .into_iter()
            .enumerate()
            .map(|(position, allocation)| NewAllocation {
                id: Uuid::new_v4(),
                strategy_id,
                position: position as i32,
                adapter_index: i64::from(allocation.adapter_index),
                percentage: i32::from(allocation.percentage),
                protocol: allocation.protocol,
            })
            .collect();

        let created = self
            .repository
            .create_strategy(strategy, allocations)
            .await?;
        info!(strategy_id = %strategy_id, "Strategy created");
        Ok(created)
    }

    pub async fn get_strategy(&self, id: Uuid) -> Result<StrategyWithAllocations, ServiceError> {
        Ok(self.repository.find_strategy(id).await?)
    }

    pub async fn list_strategies(
        &self,
        pagination: Pagination,
    ) -> Result<Vec<StrategyWithAllocations>, ServiceError> {
        Ok(self.repository.list_strategies(pagination).await?)
    }

    #[instrument(skip(self, registration), fields(address = ?registration.address))]
    pub async fn register_vault(
        &self,
        registration: VaultRegistration,
    ) -> Result<Vault, ServiceError> {
        let address = hex_string(registration.address);
        let vault = NewVault {
            id: Uuid::new_v4(),
            address: address.clone(),
            token_address: hex_string(registration.token_address),
            token_symbol: registration.token_symbol,
            token_name: registration.token_name,
            is_active: true,
            total_assets: registration.total_assets,
        };

        match self.repository.create_vault(vault).await {
            Ok(vault) => {
                info!(vault_id = %vault.id, "Vault registered");
                Ok(vault)
            }
            Err(DatabaseError::UniqueViolation { .. }) => Err(ServiceError::InvalidRequest(
                format!("vault {address} is already registered"),
            )),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn get_vault(&self, id: Uuid) -> Result<Vault, ServiceError> {
        Ok(self.repository.find_vault(id).await?)
    }

    pub async fn list_vaults(&self, pagination: Pagination) -> Result<Vec<Vault>, ServiceError> {
        Ok(self.repository.list_vaults(pagination).await?)
    }

    pub async fn get_execution(&self, id: Uuid) -> Result<ExecutionDetails, ServiceError> {
        Ok(self.repository.find_execution(id).await?)
    }

    pub async fn list_executions(
        &self,
        pagination: Pagination,
    ) -> Result<Vec<ExecutionDetails>, ServiceError> {
        Ok(self.repository.list_executions(pagination).await?)
    }

    /// Submits the strategy's allocations for `vault_id` and waits for the
    /// outcome.
    ///
    /// Only a pending strategy can be executed. The strategy ends up
    /// `completed` or `failed` and the execution records what happened
    /// on-chain.
    #[instrument(skip(self))]
    pub async fn execute_strategy(
        &self,
        strategy_id: Uuid,
        vault_id: Uuid,
    ) -> Result<Execution, ServiceError> {
        let strategy = self.repository.find_strategy(strategy_id).await?;
        let vault = self.repository.find_vault(vault_id).await?;

        if strategy.strategy.status() != Some(StrategyStatus::Pending) {
            return Err(ServiceError::NotPending {
                strategy_id,
                status: strategy.strategy.status.clone(),
            });
        }

        let execution = self
            .repository
            .begin_strategy_execution(strategy_id, vault_id, Utc::now())
            .await?
            .ok_or_else(|| ServiceError::NotPending {
                strategy_id,
                status: StrategyStatus::Executing.as_str().to_string(),
            })?;
        info!(execution_id = %execution.id, "Strategy claimed for execution");

        let targets: Vec<AllocationTarget> = strategy
            .allocations
            .iter()
            .map(|allocation| AllocationTarget {
                adapter_index: U256::from(allocation.adapter_index as u64),
                allocation: U256::from(allocation.percentage as u64),
            })
            .collect();
        let token_address = vault.token_address;
        let contracts = self.contracts.clone();

        self.spawn_pipeline(execution, ExecutionKind::Strategy, async move {
            let token = parse_address(&token_address)?;
            contracts.update_holding_allocation(token, &targets).await
        })
        .await
    }

    /// Withdraws every adapter position of the vault's token.
    #[instrument(skip(self))]
    pub async fn withdraw_all_investments(&self, vault_id: Uuid) -> Result<Execution, ServiceError> {
        let vault = self.repository.find_vault(vault_id).await?;
        let execution = self.repository.begin_withdraw_all(vault.id).await?;

        let contracts = self.contracts.clone();
        let token_address = vault.token_address;

        self.spawn_pipeline(execution, ExecutionKind::WithdrawAll, async move {
            let token = parse_address(&token_address)?;
            contracts.withdraw_all_investments(token).await
        })
        .await
    }

    /// Runs the submission on its own task so the execution is settled even
    /// when the caller goes away.
    async fn spawn_pipeline<F>(
        &self,
        execution: Execution,
        kind: ExecutionKind,
        submit: F,
    ) -> Result<Execution, ServiceError>
    where
        F: Future<Output = Result<SentTransaction, ChainError>> + Send + 'static,
    {
        let execution_id = execution.id;
        let service = self.clone();

        tokio::spawn(async move { service.run_pipeline(execution, kind, submit).await })
            .await
            .map_err(|err| ServiceError::ExecutionFailed {
                execution_id,
                tx_hash: None,
                message: format!("execution task aborted: {err}"),
            })?
    }

    async fn run_pipeline<F>(
        &self,
        execution: Execution,
        kind: ExecutionKind,
        submit: F,
    ) -> Result<Execution, ServiceError>
    where
        F: Future<Output = Result<SentTransaction, ChainError>>,
    {
        let outcome = match submit.await {
            Ok(sent) => {
                self.metrics.transactions.record_submitted(kind.as_str());
                match self.contracts.wait_for_transaction(sent.hash).await {
                    Ok(receipt) => SubmissionOutcome::from_receipt(sent, receipt),
                    Err(err) => SubmissionOutcome::Unconfirmed {
                        sent,
                        error: err.to_string(),
                    },
                }
            }
            Err(err) => SubmissionOutcome::NotSent {
                error: err.to_string(),
            },
        };

        let settled = outcome.settle(execution.id, Utc::now());
        let strategy_status = execution.strategy_id.map(|_| settled.strategy_status);
        let tx_hash = settled.update.tx_hash.clone();

        let finalized = self
            .repository
            .finalize_execution(
                execution.id,
                settled.update.clone(),
                settled.transaction,
                strategy_status,
            )
            .await;
        let execution = match finalized {
            Ok(execution) => execution,
            Err(err) => {
                error!(execution_id = %execution.id, ?err, "Failed to persist execution outcome");
                self.abandon_execution(&execution, &settled.update, &err)
                    .await;
                return Err(err.into());
            }
        };

        let label = match kind {
            ExecutionKind::Strategy => ExecutionKindLabel::Strategy,
            ExecutionKind::WithdrawAll => ExecutionKindLabel::WithdrawAll,
        };
        self.metrics
            .executions
            .record_finished(label, &execution.status);

        match outcome.error() {
            None => {
                info!(execution_id = %execution.id, tx_hash = ?tx_hash, "Execution completed");
                Ok(execution)
            }
            Some(message) => {
                warn!(execution_id = %execution.id, tx_hash = ?tx_hash, %message, "Execution failed");
                Err(ServiceError::ExecutionFailed {
                    execution_id: execution.id,
                    tx_hash,
                    message,
                })
            }
        }
    }
}

impl StrategyService {
    /// Marks the execution, and its strategy when there is one, as failed
    /// after the full outcome could not be written. The transaction row is
    /// skipped; `tx_hash` stays on the execution for reconciliation.
    async fn abandon_execution(
        &self,
        execution: &Execution,
        update: &ExecutionOutcomeUpdate,
        cause: &DatabaseError,
    ) {
        let outcome = update.error.as_deref().unwrap_or("transaction confirmed");
        let fallback = ExecutionOutcomeUpdate {
            status: ExecutionStatus::Failed.as_str().to_string(),
            error: Some(format!("{outcome}; outcome not persisted: {cause}")),
            ..update.clone()
        };
        let strategy_status = execution.strategy_id.map(|_| StrategyStatus::Failed);

        if let Err(err) = self
            .repository
            .finalize_execution(execution.id, fallback, None, strategy_status)
            .await
        {
            error!(
                execution_id = %execution.id,
                tx_hash = ?update.tx_hash,
                ?err,
                "Execution left in flight, reconcile manually"
            );
        }
    }
}

/// Parses a decimal uint256 amount.
pub fn parse_amount(input: &str) -> Result<U256, ServiceError> {
    U256::from_dec_str(input.trim())
        .map_err(|_| ServiceError::InvalidRequest(format!("'{input}' is not a valid uint256 amount")))
}

/// Parses a non-negative decimal total, e.g. a vault's asset snapshot.
pub fn parse_total_assets(input: &str) -> Result<BigDecimal, ServiceError> {
    let value = BigDecimal::from_str(input.trim())
        .map_err(|_| ServiceError::InvalidRequest(format!("'{input}' is not a decimal number")))?;
    if value < BigDecimal::from(0) {
        return Err(ServiceError::InvalidRequest(
            "total_assets must not be negative".to_string(),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use aivault_chain::abi::vault_manager;
    use aivault_chain::testing::{MOCK_GAS_USED, MockChainClient, ReceiptMode};
    use ethers::abi::Token;

    use super::*;
    use crate::testing::InMemoryRepository;

    const TOKEN: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";

    struct Harness {
        chain: Arc<MockChainClient>,
        repository: Arc<InMemoryRepository>,
        service: StrategyService,
    }

    fn harness() -> Harness {
        let chain = Arc::new(MockChainClient::new());
        let repository = Arc::new(InMemoryRepository::new());
        let contracts = Arc::new(ContractService::new(
            chain.clone(),
            Address::repeat_byte(0x42),
        ));
        let service = StrategyService::new(repository.clone(), contracts, MetricsRegistry::new());

        Harness {
            chain,
            repository,
            service,
        }
    }

    async fn seed(h: &Harness) -> (Uuid, Uuid) {
        let strategy = h
            .service
            .create_strategy(StrategyDraft {
                name: "balanced".to_string(),
                description: None,
                allocations: vec![
                    AllocationDraft {
                        adapter_index: 0,
                        percentage: 600,
                        protocol: "aave".to_string(),
                    },
                    AllocationDraft {
                        adapter_index: 2,
                        percentage: 400,
                        protocol: "uniswap_v3".to_string(),
                    },
                ],
            })
            .await
            .unwrap();
        let vault = h
            .service
            .register_vault(VaultRegistration {
                address: Address::repeat_byte(0x77),
                token_address: parse_address(TOKEN).unwrap(),
                token_symbol: "WETH".to_string(),
                token_name: "Wrapped Ether".to_string(),
                total_assets: BigDecimal::from(0),
            })
            .await
            .unwrap();

        (strategy.strategy.id, vault.id)
    }

    #[tokio::test]
    async fn test_successful_execution_completes_strategy() {
        let h = harness();
        let (strategy_id, vault_id) = seed(&h).await;

        let execution = h
            .service
            .execute_strategy(strategy_id, vault_id)
            .await
            .unwrap();

        assert_eq!(execution.status, "completed");
        assert!(execution.tx_hash.is_some());
        assert_eq!(execution.gas_used, Some(MOCK_GAS_USED as i64));
        assert!(execution.completed_at.is_some());
        assert_eq!(h.repository.strategy(strategy_id).unwrap().status, "completed");

        let sent = h.chain.sent();
        assert_eq!(sent.len(), 1);
        let args = vault_manager::UPDATE_HOLDING_ALLOCATION
            .decode(&sent[0].data)
            .unwrap();
        assert_eq!(args[0], Token::Address(parse_address(TOKEN).unwrap()));
        assert_eq!(
            args[1],
            Token::Array(vec![Token::Uint(U256::from(0)), Token::Uint(U256::from(2))])
        );

        let transactions = h.repository.transactions();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].status, "confirmed");
        assert_eq!(Some(&transactions[0].tx_hash), execution.tx_hash.as_ref());
    }

    #[tokio::test]
    async fn test_non_pending_strategy_sends_nothing() {
        let h = harness();
        let (strategy_id, vault_id) = seed(&h).await;
        h.service
            .execute_strategy(strategy_id, vault_id)
            .await
            .unwrap();

        let result = h.service.execute_strategy(strategy_id, vault_id).await;

        assert!(matches!(
            result,
            Err(ServiceError::NotPending { ref status, .. }) if status == "completed"
        ));
        assert_eq!(h.chain.sent().len(), 1);
        assert_eq!(h.repository.executions().len(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_failure_fails_without_hash() {
        let h = harness();
        let (strategy_id, vault_id) = seed(&h).await;
        h.chain.fail_sends("insufficient funds for gas");

        let result = h.service.execute_strategy(strategy_id, vault_id).await;

        match result {
            Err(ServiceError::ExecutionFailed {
                tx_hash, message, ..
            }) => {
                assert!(tx_hash.is_none());
                assert!(message.contains("insufficient funds"));
            }
            other => panic!("expected an execution failure, got {other:?}"),
        }

        let execution = &h.repository.executions()[0];
        assert_eq!(execution.status, "failed");
        assert!(execution.tx_hash.is_none());
        assert!(execution.gas_used.is_none());
        assert!(h.repository.transactions().is_empty());
        assert_eq!(h.repository.strategy(strategy_id).unwrap().status, "failed");
    }

    #[tokio::test]
    async fn test_receipt_timeout_keeps_hash_and_fails() {
        let h = harness();
        let (strategy_id, vault_id) = seed(&h).await;
        h.chain.set_receipt_mode(ReceiptMode::Missing);

        let result = h.service.execute_strategy(strategy_id, vault_id).await;

        assert!(matches!(
            result,
            Err(ServiceError::ExecutionFailed { tx_hash: Some(_), .. })
        ));
        let execution = &h.repository.executions()[0];
        assert_eq!(execution.status, "failed");
        assert!(execution.tx_hash.is_some());
        assert!(execution.gas_used.is_none());
        assert_eq!(h.repository.transactions()[0].status, "pending");
    }

    #[tokio::test]
    async fn test_failed_finalize_still_fails_strategy() {
        let h = harness();
        let (strategy_id, vault_id) = seed(&h).await;
        h.repository.fail_next_finalizes(1);

        let result = h.service.execute_strategy(strategy_id, vault_id).await;

        assert!(matches!(result, Err(ServiceError::Database(_))));
        assert_eq!(h.repository.strategy(strategy_id).unwrap().status, "failed");
        let execution = &h.repository.executions()[0];
        assert_eq!(execution.status, "failed");
        assert!(execution.tx_hash.is_some());
        assert!(
            execution
                .error
                .as_deref()
                .unwrap()
                .contains("outcome not persisted")
        );
        assert!(h.repository.transactions().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_store_leaves_execution_in_flight() {
        let h = harness();
        let (strategy_id, vault_id) = seed(&h).await;
        h.repository.fail_next_finalizes(2);

        let result = h.service.execute_strategy(strategy_id, vault_id).await;

        assert!(matches!(result, Err(ServiceError::Database(_))));
        assert_eq!(h.repository.strategy(strategy_id).unwrap().status, "executing");
        assert_eq!(h.repository.executions()[0].status, "pending");
    }

    #[tokio::test]
    async fn test_unknown_vault_is_not_found() {
        let h = harness();
        let (strategy_id, _) = seed(&h).await;

        let result = h.service.execute_strategy(strategy_id, Uuid::new_v4()).await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
        assert_eq!(h.repository.strategy(strategy_id).unwrap().status, "pending");
    }

    #[tokio::test]
    async fn test_withdraw_all_records_execution_without_strategy() {
        let h = harness();
        let (_, vault_id) = seed(&h).await;
        h.chain.set_receipt_mode(ReceiptMode::Reverted);

        let result = h.service.withdraw_all_investments(vault_id).await;

        assert!(matches!(result, Err(ServiceError::ExecutionFailed { .. })));
        let execution = &h.repository.executions()[0];
        assert_eq!(execution.kind, "withdraw_all");
        assert!(execution.strategy_id.is_none());
        assert_eq!(execution.gas_used, Some(MOCK_GAS_USED as i64));
        assert_eq!(h.repository.transactions()[0].status, "failed");
        assert!(
            vault_manager::WITHDRAW_ALL_INVESTMENTS
                .decode(&h.chain.sent()[0].data)
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_duplicate_vault_is_rejected() {
        let h = harness();
        seed(&h).await;

        let result = h
            .service
            .register_vault(VaultRegistration {
                address: Address::repeat_byte(0x77),
                token_address: Address::repeat_byte(0x01),
                token_symbol: "USDC".to_string(),
                token_name: "USD Coin".to_string(),
                total_assets: BigDecimal::from(0),
            })
            .await;

        assert!(matches!(result, Err(ServiceError::InvalidRequest(_))));
    }

    #[test]
    fn test_amount_parsing() {
        assert_eq!(parse_amount("1000").unwrap(), U256::from(1000));
        assert!(parse_amount("-1").is_err());
        assert!(parse_amount("1.5").is_err());
        assert!(parse_total_assets("-3").is_err());
        assert_eq!(parse_total_assets(" 12.5 ").unwrap(), BigDecimal::from_str("12.5").unwrap());
    }
}
