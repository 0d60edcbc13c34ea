use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use ethers::types::{Address, U256};
use url::Url;

use crate::error::ChainError;

pub const DEFAULT_MAX_GAS_LIMIT: u64 = 15_000_000;

/// Everything the chain client and contract service need to talk to the
/// vault manager.
#[derive(Clone)]
pub struct ChainConfig {
    pub rpc_url: Url,
    pub private_key: String,
    pub vault_manager: Address,
    pub max_gas_limit: U256,
    pub receipt_poll_interval: Duration,
    pub receipt_timeout: Duration,
    pub nonce_resync_interval: Duration,
    pub tokens: TokenBook,
}

impl ChainConfig {
    pub fn new(rpc_url: &str, private_key: &str, vault_manager: &str) -> Result<Self, ChainError> {
        let rpc_url = Url::parse(rpc_url)
            .map_err(|e| ChainError::Config(format!("invalid RPC url '{rpc_url}': {e}")))?;

        if private_key.trim().is_empty() {
            return Err(ChainError::Config("private key is empty".to_string()));
        }

        Ok(Self {
            rpc_url,
            private_key: private_key.trim().to_string(),
            vault_manager: parse_address(vault_manager)?,
            max_gas_limit: U256::from(DEFAULT_MAX_GAS_LIMIT),
            receipt_poll_interval: Duration::from_secs(2),
            receipt_timeout: Duration::from_secs(180),
            nonce_resync_interval: Duration::from_secs(60),
            tokens: TokenBook::default(),
        })
    }
}

impl fmt::Debug for ChainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainConfig")
            .field("rpc_url", &self.rpc_url.as_str())
            .field("private_key", &"<redacted>")
            .field("vault_manager", &self.vault_manager)
            .field("max_gas_limit", &self.max_gas_limit)
            .field("receipt_poll_interval", &self.receipt_poll_interval)
            .field("receipt_timeout", &self.receipt_timeout)
            .field("nonce_resync_interval", &self.nonce_resync_interval)
            .field("tokens", &self.tokens)
            .finish()
    }
}

/// Parses a `0x`-prefixed, 20 byte hex address.
pub fn parse_address(input: &str) -> Result<Address, ChainError> {
    let trimmed = input.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .filter(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .ok_or_else(|| ChainError::InvalidAddress(input.to_string()))?;

    Address::from_str(hex).map_err(|_| ChainError::InvalidAddress(input.to_string()))
}

/// Known token symbols, accepted wherever a token address is expected.
#[derive(Debug, Clone, Default)]
pub struct TokenBook {
    tokens: BTreeMap<String, Address>,
}

impl TokenBook {
    #[must_use]
    pub fn with_token(mut self, symbol: &str, address: Address) -> Self {
        self.tokens.insert(symbol.to_uppercase(), address);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Address)> {
        self.tokens
            .iter()
            .map(|(symbol, address)| (symbol.as_str(), *address))
    }

    pub fn symbol_of(&self, address: Address) -> Option<&str> {
        self.iter()
            .find(|(_, known)| *known == address)
            .map(|(symbol, _)| symbol)
    }

    /// Resolves either a hex address or a configured symbol.
    pub fn resolve(&self, input: &str) -> Result<Address, ChainError> {
        let trimmed = input.trim();
        if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
            return parse_address(trimmed);
        }

        self.tokens
            .get(&trimmed.to_uppercase())
            .copied()
            .ok_or_else(|| ChainError::InvalidAddress(input.to_string()))
    }
}
