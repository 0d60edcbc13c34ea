use std::sync::Arc;

use ethers::types::{Address, Bytes, H256, U256};

use crate::abi::{self, Fragment};
use crate::contract::AdapterExecutor;
use crate::error::ChainError;

pub const SET_TOKEN_CONFIG: Fragment = Fragment::new(
    "setTokenConfig",
    "function setTokenConfig(address token, uint256 slippageTolerance, address counterPartyToken, address VaultAddress)",
);

pub const UPDATE_TOKEN_SLIPPAGE_TOLERANCE: Fragment = Fragment::new(
    "UpdateTokenSlippageTolerance",
    "function UpdateTokenSlippageTolerance(address token, uint256 slippageTolerance)",
);

pub const UPDATE_TOKEN_CONFIG_AND_REINVEST: Fragment = Fragment::new(
    "updateTokenConfigAndReinvest",
    "function updateTokenConfigAndReinvest(address token, address counterPartyToken)",
);

pub fn set_token_config_calldata(
    token: Address,
    slippage_tolerance: U256,
    counter_party_token: Address,
    vault: Address,
) -> Result<Bytes, ChainError> {
    SET_TOKEN_CONFIG.encode(&[
        abi::address(token),
        abi::uint(slippage_tolerance),
        abi::address(counter_party_token),
        abi::address(vault),
    ])
}

pub fn update_slippage_calldata(
    token: Address,
    slippage_tolerance: U256,
) -> Result<Bytes, ChainError> {
    UPDATE_TOKEN_SLIPPAGE_TOLERANCE.encode(&[abi::address(token), abi::uint(slippage_tolerance)])
}

pub fn update_config_calldata(
    token: Address,
    counter_party_token: Address,
) -> Result<Bytes, ChainError> {
    UPDATE_TOKEN_CONFIG_AND_REINVEST
        .encode(&[abi::address(token), abi::address(counter_party_token)])
}

/// Constant product pool adapter. Slippage tolerances are in basis points.
pub struct UniswapV2Adapter {
    executor: Arc<dyn AdapterExecutor>,
}

impl UniswapV2Adapter {
    pub fn new(executor: Arc<dyn AdapterExecutor>) -> Self {
        Self { executor }
    }

    pub async fn set_token_config(
        &self,
        adapter_index: U256,
        token: Address,
        slippage_tolerance: U256,
        counter_party_token: Address,
        vault: Address,
    ) -> Result<H256, ChainError> {
        let data = set_token_config_calldata(token, slippage_tolerance, counter_party_token, vault)?;
        self.executor.execute(adapter_index, U256::zero(), data).await
    }

    pub async fn update_slippage_tolerance(
        &self,
        adapter_index: U256,
        token: Address,
        slippage_tolerance: U256,
    ) -> Result<H256, ChainError> {
        let data = update_slippage_calldata(token, slippage_tolerance)?;
        self.executor.execute(adapter_index, U256::zero(), data).await
    }

    /// Switches the pair's counter-party token and reinvests the position.
    pub async fn update_token_config(
        &self,
        adapter_index: U256,
        token: Address,
        counter_party_token: Address,
    ) -> Result<H256, ChainError> {
        let data = update_config_calldata(token, counter_party_token)?;
        self.executor.execute(adapter_index, U256::zero(), data).await
    }
}

#[cfg(test)]
mod tests {
    use ethers::abi::Token;
    use ethers::utils::keccak256;

    use super::*;

    #[test]
    fn test_slippage_update_decodes_to_requested_bps() {
        let token = Address::repeat_byte(0xaa);

        let calldata = update_slippage_calldata(token, U256::from(100)).unwrap();
        let args = UPDATE_TOKEN_SLIPPAGE_TOLERANCE.decode(&calldata).unwrap();

        assert_eq!(args[0], Token::Address(token));
        assert_eq!(args[1], Token::Uint(U256::from(100)));
    }

    #[test]
    fn test_selectors_keep_contract_casing() {
        assert_eq!(
            UPDATE_TOKEN_SLIPPAGE_TOLERANCE.selector().unwrap(),
            keccak256(b"UpdateTokenSlippageTolerance(address,uint256)")[..4]
        );
        assert_eq!(
            SET_TOKEN_CONFIG.selector().unwrap(),
            keccak256(b"setTokenConfig(address,uint256,address,address)")[..4]
        );
        assert_eq!(
            UPDATE_TOKEN_CONFIG_AND_REINVEST.selector().unwrap(),
            keccak256(b"updateTokenConfigAndReinvest(address,address)")[..4]
        );
    }

    #[test]
    fn test_set_token_config_argument_order() {
        let token = Address::repeat_byte(0x01);
        let counter_party = Address::repeat_byte(0x02);
        let vault = Address::repeat_byte(0x03);

        let calldata =
            set_token_config_calldata(token, U256::from(50), counter_party, vault).unwrap();

        assert_eq!(
            SET_TOKEN_CONFIG.decode(&calldata).unwrap(),
            vec![
                Token::Address(token),
                Token::Uint(U256::from(50)),
                Token::Address(counter_party),
                Token::Address(vault),
            ]
        );
    }
}
