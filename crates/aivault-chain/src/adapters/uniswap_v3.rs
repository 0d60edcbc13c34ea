use std::sync::Arc;

use ethers::types::{Address, Bytes, H256, U256};

use crate::abi::{self, Fragment};
use crate::contract::AdapterExecutor;
use crate::error::ChainError;

pub const SET_TOKEN_CONFIG: Fragment = Fragment::new(
    "setTokenConfig",
    "function setTokenConfig(address token, address counterPartyToken, uint256 slippageTolerance, uint24 feeTier, int24 tickLower, int24 tickUpper, address VaultAddress)",
);

pub const UPDATE_TOKEN_SLIPPAGE_TOLERANCE: Fragment = Fragment::new(
    "UpdateTokenSlippageTolerance",
    "function UpdateTokenSlippageTolerance(address token, uint256 slippageTolerance)",
);

pub const UPDATE_TOKEN_CONFIG: Fragment = Fragment::new(
    "UpdateTokenConfig",
    "function UpdateTokenConfig(address token, address counterPartyToken, uint24 feeTier, int24 tickLower, int24 tickUpper)",
);

/// Concentrated liquidity position: pool fee tier and tick range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRange {
    pub fee_tier: u32,
    pub tick_lower: i32,
    pub tick_upper: i32,
}

impl PositionRange {
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.tick_lower >= self.tick_upper {
            return Err(ChainError::InvalidArgument(format!(
                "tick_lower ({}) must be below tick_upper ({})",
                self.tick_lower, self.tick_upper
            )));
        }
        Ok(())
    }
}

pub fn set_token_config_calldata(
    token: Address,
    counter_party_token: Address,
    slippage_tolerance: U256,
    range: PositionRange,
    vault: Address,
) -> Result<Bytes, ChainError> {
    range.validate()?;
    SET_TOKEN_CONFIG.encode(&[
        abi::address(token),
        abi::address(counter_party_token),
        abi::uint(slippage_tolerance),
        abi::uint24(range.fee_tier)?,
        abi::int24(range.tick_lower)?,
        abi::int24(range.tick_upper)?,
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
    range: PositionRange,
) -> Result<Bytes, ChainError> {
    range.validate()?;
    UPDATE_TOKEN_CONFIG.encode(&[
        abi::address(token),
        abi::address(counter_party_token),
        abi::uint24(range.fee_tier)?,
        abi::int24(range.tick_lower)?,
        abi::int24(range.tick_upper)?,
    ])
}

pub struct UniswapV3Adapter {
    executor: Arc<dyn AdapterExecutor>,
}

impl UniswapV3Adapter {
    pub fn new(executor: Arc<dyn AdapterExecutor>) -> Self {
        Self { executor }
    }

    pub async fn set_token_config(
        &self,
        adapter_index: U256,
        token: Address,
        counter_party_token: Address,
        slippage_tolerance: U256,
        range: PositionRange,
        vault: Address,
    ) -> Result<H256, ChainError> {
        let data =
            set_token_config_calldata(token, counter_party_token, slippage_tolerance, range, vault)?;
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

    pub async fn update_token_config(
        &self,
        adapter_index: U256,
        token: Address,
        counter_party_token: Address,
        range: PositionRange,
    ) -> Result<H256, ChainError> {
        let data = update_config_calldata(token, counter_party_token, range)?;
        self.executor.execute(adapter_index, U256::zero(), data).await
    }
}

#[cfg(test)]
mod tests {
    use ethers::abi::Token;
    use ethers::types::I256;
    use ethers::utils::keccak256;

    use super::*;

    const RANGE: PositionRange = PositionRange {
        fee_tier: 3000,
        tick_lower: -887_220,
        tick_upper: 887_220,
    };

    #[test]
    fn test_selector_uses_declared_small_int_types() {
        assert_eq!(
            SET_TOKEN_CONFIG.selector().unwrap(),
            keccak256(b"setTokenConfig(address,address,uint256,uint24,int24,int24,address)")[..4]
        );
        assert_eq!(
            UPDATE_TOKEN_CONFIG.selector().unwrap(),
            keccak256(b"UpdateTokenConfig(address,address,uint24,int24,int24)")[..4]
        );
    }

    #[test]
    fn test_negative_ticks_round_trip() {
        let token = Address::repeat_byte(0xaa);
        let counter_party = Address::repeat_byte(0xcc);

        let calldata = update_config_calldata(token, counter_party, RANGE).unwrap();
        let args = UPDATE_TOKEN_CONFIG.decode(&calldata).unwrap();

        assert_eq!(calldata.len(), 4 + 5 * 32);
        assert_eq!(args[2], Token::Uint(U256::from(3000)));
        assert_eq!(args[3], Token::Int(I256::from(-887_220).into_raw()));
        assert_eq!(args[4], Token::Int(I256::from(887_220).into_raw()));
    }

    #[test]
    fn test_invalid_ranges_are_rejected() {
        let token = Address::repeat_byte(0xaa);
        let inverted = PositionRange {
            tick_lower: 60,
            tick_upper: -60,
            ..RANGE
        };
        let oversized_fee = PositionRange {
            fee_tier: 1 << 24,
            ..RANGE
        };

        assert!(update_config_calldata(token, token, inverted).is_err());
        assert!(matches!(
            update_config_calldata(token, token, oversized_fee),
            Err(ChainError::InvalidArgument(_))
        ));
    }
}
