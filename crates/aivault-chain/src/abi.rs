//! Human readable ABI fragments for every contract function this service calls,
//! encoded with the standard contract ABI (selector = first four bytes of the
//! keccak256 of the canonical signature).

use ethers::abi::{Function, Token, parse_abi};
use ethers::types::{Address, Bytes, I256, U256};

use crate::error::ChainError;

const UINT24_MAX: u32 = (1 << 24) - 1;
const INT24_MIN: i32 = -(1 << 23);
const INT24_MAX: i32 = (1 << 23) - 1;

/// One contract function, declared in human readable form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    name: &'static str,
    declaration: &'static str,
}

impl Fragment {
    pub const fn new(name: &'static str, declaration: &'static str) -> Self {
        Self { name, declaration }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub fn function(&self) -> Result<Function, ChainError> {
        let abi = parse_abi(&[self.declaration])
            .map_err(|e| ChainError::Abi(format!("invalid fragment for {}: {e}", self.name)))?;
        abi.function(self.name).cloned().map_err(ChainError::abi)
    }

    /// Canonical signature, e.g. `withdrawAllInvestments(address)`.
    pub fn signature(&self) -> Result<String, ChainError> {
        let function = self.function()?;
        let inputs: Vec<String> = function
            .inputs
            .iter()
            .map(|param| param.kind.to_string())
            .collect();
        Ok(format!("{}({})", function.name, inputs.join(",")))
    }

    pub fn selector(&self) -> Result<[u8; 4], ChainError> {
        Ok(self.function()?.short_signature())
    }

    /// Selector followed by the encoded arguments.
    pub fn encode(&self, args: &[Token]) -> Result<Bytes, ChainError> {
        self.function()?
            .encode_input(args)
            .map(Bytes::from)
            .map_err(|e| ChainError::Abi(format!("{}: {e}", self.name)))
    }

    /// Inverse of [`Fragment::encode`]. Fails when the selector does not match.
    pub fn decode(&self, calldata: &[u8]) -> Result<Vec<Token>, ChainError> {
        let function = self.function()?;
        let Some((selector, body)) = calldata.split_first_chunk::<4>() else {
            return Err(ChainError::Abi(format!(
                "{}: call data shorter than a selector",
                self.name
            )));
        };

        if *selector != function.short_signature() {
            return Err(ChainError::Abi(format!(
                "{}: selector mismatch (got 0x{})",
                self.name,
                hex::encode(selector)
            )));
        }

        function.decode_input(body).map_err(ChainError::abi)
    }
}

pub mod vault_manager {
    use super::Fragment;

    pub const UPDATE_HOLDING_ALLOCATION: Fragment = Fragment::new(
        "updateHoldingAllocation",
        "function updateHoldingAllocation(address token, uint256[] adapterIndices, uint256[] allocationData)",
    );

    pub const PARTIAL_UPDATE_HOLDING_ALLOCATION: Fragment = Fragment::new(
        "partialUpdateHoldingAllocation",
        "function partialUpdateHoldingAllocation(address token, uint256[] divestAdapterIndices, uint256[] divestAmounts, uint256[] investAdapterIndices, uint256[] investAmounts, uint256[] investAllocations)",
    );

    pub const WITHDRAW_ALL_INVESTMENTS: Fragment = Fragment::new(
        "withdrawAllInvestments",
        "function withdrawAllInvestments(address token)",
    );

    pub const EXECUTE: Fragment = Fragment::new(
        "execute",
        "function execute(uint256 adapterIndex, uint256 value, bytes data)",
    );
}

pub const fn address(value: Address) -> Token {
    Token::Address(value)
}

pub const fn uint(value: U256) -> Token {
    Token::Uint(value)
}

pub fn uint_array(values: impl IntoIterator<Item = U256>) -> Token {
    Token::Array(values.into_iter().map(Token::Uint).collect())
}

/// `uint24`, zero-extended to a full word.
pub fn uint24(value: u32) -> Result<Token, ChainError> {
    if value > UINT24_MAX {
        return Err(ChainError::InvalidArgument(format!(
            "{value} does not fit in uint24"
        )));
    }
    Ok(Token::Uint(U256::from(value)))
}

/// `int24`, sign-extended to a full two's complement word.
pub fn int24(value: i32) -> Result<Token, ChainError> {
    if !(INT24_MIN..=INT24_MAX).contains(&value) {
        return Err(ChainError::InvalidArgument(format!(
            "{value} does not fit in int24"
        )));
    }
    Ok(Token::Int(I256::from(value).into_raw()))
}

#[cfg(test)]
mod tests {
    use ethers::utils::keccak256;

    use super::vault_manager::*;
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn word(bytes: &[u8], index: usize) -> U256 {
        U256::from_big_endian(&bytes[4 + index * 32..4 + (index + 1) * 32])
    }

    #[test]
    fn test_selectors_match_keccak_of_signature() {
        for (fragment, signature) in [
            (
                UPDATE_HOLDING_ALLOCATION,
                "updateHoldingAllocation(address,uint256[],uint256[])",
            ),
            (
                PARTIAL_UPDATE_HOLDING_ALLOCATION,
                "partialUpdateHoldingAllocation(address,uint256[],uint256[],uint256[],uint256[],uint256[])",
            ),
            (WITHDRAW_ALL_INVESTMENTS, "withdrawAllInvestments(address)"),
            (EXECUTE, "execute(uint256,uint256,bytes)"),
        ] {
            assert_eq!(fragment.signature().unwrap(), signature);
            assert_eq!(
                fragment.selector().unwrap(),
                keccak256(signature.as_bytes())[..4]
            );
        }
    }

    #[test]
    fn test_allocation_update_round_trips() {
        let indices = vec![U256::from(0), U256::from(2), U256::from(5)];
        let allocations = vec![U256::from(500), U256::from(300), U256::from(200)];
        let args = vec![
            address(addr(0xaa)),
            uint_array(indices.clone()),
            uint_array(allocations.clone()),
        ];

        let calldata = UPDATE_HOLDING_ALLOCATION.encode(&args).unwrap();

        assert_eq!(
            calldata[..4],
            UPDATE_HOLDING_ALLOCATION.selector().unwrap()[..]
        );
        assert_eq!(UPDATE_HOLDING_ALLOCATION.decode(&calldata).unwrap(), args);
    }

    #[test]
    fn test_dynamic_arrays_are_offset_and_length_prefixed() {
        let args = vec![
            address(addr(0xaa)),
            uint_array([U256::from(1), U256::from(2)]),
            uint_array([U256::from(600), U256::from(400)]),
        ];
        let calldata = UPDATE_HOLDING_ALLOCATION.encode(&args).unwrap();

        // head: token, offset of first array, offset of second array
        assert_eq!(calldata.len(), 4 + 32 * (3 + 3 + 3));
        assert_eq!(word(&calldata, 1), U256::from(0x60));
        assert_eq!(word(&calldata, 2), U256::from(0x60 + 3 * 32));
        // first tail: length then elements
        assert_eq!(word(&calldata, 3), U256::from(2));
        assert_eq!(word(&calldata, 4), U256::from(1));
        assert_eq!(word(&calldata, 5), U256::from(2));
        // second tail
        assert_eq!(word(&calldata, 6), U256::from(2));
        assert_eq!(word(&calldata, 7), U256::from(600));
        assert_eq!(word(&calldata, 8), U256::from(400));
    }

    #[test]
    fn test_execute_pads_bytes_to_word_boundary() {
        let inner = Bytes::from(vec![0xde, 0xad, 0xbe, 0xef, 0x01]);
        let calldata = EXECUTE
            .encode(&[
                uint(U256::from(3)),
                uint(U256::zero()),
                Token::Bytes(inner.to_vec()),
            ])
            .unwrap();

        // adapterIndex, value, offset, length, one padded data word
        assert_eq!(calldata.len(), 4 + 5 * 32);
        assert_eq!(word(&calldata, 2), U256::from(0x60));
        assert_eq!(word(&calldata, 3), U256::from(5));
        assert_eq!(calldata[4 + 4 * 32..4 + 4 * 32 + 5], inner[..]);
        assert!(calldata[4 + 4 * 32 + 5..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_decode_rejects_foreign_selector() {
        let calldata = WITHDRAW_ALL_INVESTMENTS
            .encode(&[address(addr(0x11))])
            .unwrap();

        let Err(ChainError::Abi(message)) = EXECUTE.decode(&calldata) else {
            panic!("expected an abi error");
        };
        let selector = WITHDRAW_ALL_INVESTMENTS.selector().unwrap();
        assert!(message.contains(&format!("0x{}", hex::encode(selector))));
        assert!(EXECUTE.decode(&[0x01, 0x02]).is_err());
    }

    #[test]
    fn test_int24_is_sign_extended() {
        let Token::Int(raw) = int24(-60).unwrap() else {
            panic!("expected an int token");
        };
        assert_eq!(raw, I256::from(-60).into_raw());
        assert_eq!(raw.byte(31), 0xff);

        assert!(int24(8_388_607).is_ok());
        assert!(int24(8_388_608).is_err());
        assert!(int24(-8_388_609).is_err());
    }

    #[test]
    fn test_uint24_bounds() {
        assert_eq!(uint24(3000).unwrap(), Token::Uint(U256::from(3000)));
        assert!(uint24(16_777_215).is_ok());
        assert!(uint24(16_777_216).is_err());
    }
}
