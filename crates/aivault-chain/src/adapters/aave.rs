use std::sync::Arc;

use ethers::types::{Address, Bytes, H256, U256};

use crate::abi::{self, Fragment};
use crate::contract::AdapterExecutor;
use crate::error::ChainError;

pub const SET_TOKEN_VAULT: Fragment = Fragment::new(
    "setTokenVault",
    "function setTokenVault(address token, address vault)",
);

pub fn set_token_vault_calldata(token: Address, vault: Address) -> Result<Bytes, ChainError> {
    SET_TOKEN_VAULT.encode(&[abi::address(token), abi::address(vault)])
}

pub struct AaveAdapter {
    executor: Arc<dyn AdapterExecutor>,
}

impl AaveAdapter {
    pub fn new(executor: Arc<dyn AdapterExecutor>) -> Self {
        Self { executor }
    }

    /// Pairs `token` with the vault the adapter deposits on its behalf.
    pub async fn set_token_vault(
        &self,
        adapter_index: U256,
        token: Address,
        vault: Address,
    ) -> Result<H256, ChainError> {
        let data = set_token_vault_calldata(token, vault)?;
        self.executor.execute(adapter_index, U256::zero(), data).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use ethers::abi::Token;

    use super::*;

    #[derive(Default)]
    struct RecordingExecutor {
        calls: Mutex<Vec<(U256, U256, Bytes)>>,
    }

    #[async_trait]
    impl AdapterExecutor for RecordingExecutor {
        async fn execute(
            &self,
            adapter_index: U256,
            value: U256,
            data: Bytes,
        ) -> Result<H256, ChainError> {
            self.calls.lock().unwrap().push((adapter_index, value, data));
            Ok(H256::repeat_byte(0x01))
        }
    }

    #[test]
    fn test_call_data_is_selector_plus_two_words() {
        let token = Address::repeat_byte(0xaa);
        let vault = Address::repeat_byte(0xbb);

        let calldata = set_token_vault_calldata(token, vault).unwrap();

        assert_eq!(calldata.len(), 4 + 32 + 32);
        assert_eq!(
            hex::encode(&calldata[..4]),
            hex::encode(SET_TOKEN_VAULT.selector().unwrap())
        );
        assert_eq!(
            SET_TOKEN_VAULT.decode(&calldata).unwrap(),
            vec![Token::Address(token), Token::Address(vault)]
        );
    }

    #[tokio::test]
    async fn test_forwards_with_zero_value() {
        let executor = Arc::new(RecordingExecutor::default());
        let adapter = AaveAdapter::new(executor.clone());

        let hash = adapter
            .set_token_vault(
                U256::zero(),
                Address::repeat_byte(0xaa),
                Address::repeat_byte(0xbb),
            )
            .await
            .unwrap();

        assert_eq!(hash, H256::repeat_byte(0x01));
        let calls = executor.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, U256::zero());
        assert_eq!(calls[0].1, U256::zero());
        assert_eq!(calls[0].2.len(), 68);
    }
}
