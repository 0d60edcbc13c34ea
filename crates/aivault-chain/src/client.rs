use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::middleware::signer::SignerMiddlewareError;
use ethers::prelude::abigen;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{
    Address, BlockNumber, Bytes, H256, TransactionReceipt, TransactionRequest, U256,
};
use serde::Serialize;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument, warn};

use crate::config::ChainConfig;
use crate::error::ChainError;
use crate::nonce::NonceManager;

abigen!(
    IERC20,
    r#"[
        function balanceOf(address owner) external view returns (uint256)
    ]"#
);

type SignerClient = SignerMiddleware<Arc<Provider<Http>>, LocalWallet>;

/// Options the next transaction from this key would be sent with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TxOptions {
    pub nonce: U256,
    pub gas_price: U256,
    pub gas_limit: U256,
    pub chain_id: u64,
}

/// A transaction accepted by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTransaction {
    pub hash: H256,
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub nonce: U256,
    pub gas_limit: U256,
    pub gas_price: U256,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Address derived from the signing key.
    fn address(&self) -> Address;

    async fn transact_opts(&self) -> Result<TxOptions, ChainError>;

    async fn balance(&self) -> Result<U256, ChainError>;

    async fn token_balance(&self, token: Address) -> Result<U256, ChainError>;

    /// Signs and broadcasts `(to, value, data)`. Does not wait for inclusion.
    async fn send_transaction(
        &self,
        to: Address,
        value: U256,
        data: Bytes,
    ) -> Result<SentTransaction, ChainError>;

    /// Polls until the receipt for `tx_hash` is available.
    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TransactionReceipt, ChainError>;
}

/// JSON-RPC backed client for an EVM chain, signing legacy EIP-155
/// transactions with a local key.
pub struct EvmClient {
    provider: Arc<Provider<Http>>,
    signer: SignerClient,
    chain_id: u64,
    max_gas_limit: U256,
    nonces: NonceManager,
    receipt_poll_interval: Duration,
    receipt_timeout: Duration,
}

impl EvmClient {
    /// Connects to the node and resolves the chain id. Fails when the node
    /// is unreachable.
    pub async fn connect(config: &ChainConfig) -> Result<Self, ChainError> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| ChainError::Config(format!("invalid RPC url: {e}")))?;
        let provider = Arc::new(provider);

        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| ChainError::Rpc(format!("cannot reach {}: {e}", config.rpc_url)))?
            .low_u64();

        let wallet = LocalWallet::from_str(config.private_key.trim_start_matches("0x"))
            .map_err(|e| ChainError::Config(format!("invalid private key: {e}")))?
            .with_chain_id(chain_id);

        let signer = SignerMiddleware::new(provider.clone(), wallet);

        info!(
            address = ?signer.address(),
            chain_id,
            rpc_url = %config.rpc_url,
            "Connected to chain"
        );

        Ok(Self {
            provider,
            signer,
            chain_id,
            max_gas_limit: config.max_gas_limit,
            nonces: NonceManager::new(),
            receipt_poll_interval: config.receipt_poll_interval,
            receipt_timeout: config.receipt_timeout,
        })
    }

    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn pending_nonce(&self) -> Result<U256, ChainError> {
        self.provider
            .get_transaction_count(self.address(), Some(BlockNumber::Pending.into()))
            .await
            .map_err(ChainError::rpc)
    }

    /// Aligns the cached nonce with the node's pending nonce.
    pub async fn resync_nonce(&self) -> Result<(), ChainError> {
        if let Some((cached, on_chain)) = self.nonces.reconcile(|| self.pending_nonce()).await? {
            warn!(?cached, %on_chain, "Nonce drift detected, using the node's pending nonce");
        }
        Ok(())
    }
}

fn map_send_error(err: SignerMiddlewareError<Arc<Provider<Http>>, LocalWallet>) -> ChainError {
    match err {
        SignerMiddlewareError::SignerError(err) => ChainError::Signing(err.to_string()),
        other => ChainError::Rpc(other.to_string()),
    }
}

#[async_trait]
impl ChainClient for EvmClient {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn transact_opts(&self) -> Result<TxOptions, ChainError> {
        let nonce = match self.nonces.peek().await {
            Some(nonce) => nonce,
            None => self.pending_nonce().await?,
        };
        let gas_price = self
            .provider
            .get_gas_price()
            .await
            .map_err(ChainError::rpc)?;

        Ok(TxOptions {
            nonce,
            gas_price,
            gas_limit: self.max_gas_limit,
            chain_id: self.chain_id,
        })
    }

    #[instrument(skip(self))]
    async fn balance(&self) -> Result<U256, ChainError> {
        self.provider
            .get_balance(self.address(), None)
            .await
            .map_err(ChainError::rpc)
    }

    #[instrument(skip(self))]
    async fn token_balance(&self, token: Address) -> Result<U256, ChainError> {
        IERC20::new(token, self.provider.clone())
            .balance_of(self.address())
            .call()
            .await
            .map_err(ChainError::rpc)
    }

    #[instrument(skip(self, data), fields(to = ?to, value = %value))]
    async fn send_transaction(
        &self,
        to: Address,
        value: U256,
        data: Bytes,
    ) -> Result<SentTransaction, ChainError> {
        let from = self.address();

        let gas_price = self
            .provider
            .get_gas_price()
            .await
            .map_err(ChainError::rpc)?;

        let request = TransactionRequest::new()
            .from(from)
            .to(to)
            .value(value)
            .data(data)
            .gas_price(gas_price)
            .chain_id(self.chain_id);

        let estimate = self
            .provider
            .estimate_gas(&request.clone().into(), None)
            .await
            .map_err(ChainError::rpc)?;
        let gas_limit = estimate.min(self.max_gas_limit);
        if estimate > self.max_gas_limit {
            warn!(%estimate, cap = %self.max_gas_limit, "Gas estimate above cap, clamping");
        }

        let lease = self.nonces.lease(|| self.pending_nonce()).await?;
        let nonce = lease.nonce();
        let request = request.gas(gas_limit).nonce(nonce);

        let hash = self
            .signer
            .send_transaction(request, None)
            .await
            .map_err(map_send_error)?
            .tx_hash();
        lease.commit();

        info!(
            tx_hash = ?hash,
            to = ?to,
            value = %value,
            gas_limit = %gas_limit,
            gas_price = %gas_price,
            nonce = %nonce,
            "Transaction sent"
        );

        Ok(SentTransaction {
            hash,
            from,
            to,
            value,
            nonce,
            gas_limit,
            gas_price,
        })
    }

    #[instrument(skip(self))]
    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TransactionReceipt, ChainError> {
        let started = Instant::now();

        loop {
            if let Some(receipt) = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(ChainError::rpc)?
            {
                debug!(
                    block = ?receipt.block_number,
                    status = ?receipt.status,
                    gas_used = ?receipt.gas_used,
                    "Receipt received"
                );
                return Ok(receipt);
            }

            let waited = started.elapsed();
            if waited >= self.receipt_timeout {
                return Err(ChainError::ReceiptTimeout { tx_hash, waited });
            }

            sleep(self.receipt_poll_interval).await;
        }
    }
}
