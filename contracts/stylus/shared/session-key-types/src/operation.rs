use alloy_primitives::{Address, Bytes, U256};

/// An account operation (ERC-4337 `UserOperation`, v0.6 layout).
///
/// `init_code`, `call_data` and `paymaster_and_data` are the variable-length payloads; the hash
/// encoding replaces them with their keccak digests. `signature` never enters the hash.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct Operation {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: Bytes,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub paymaster_and_data: Bytes,
    pub signature: Bytes,
}

/// A single call the account performs on behalf of an operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Call {
    pub target: Address,
    pub value: U256,
    pub data: Bytes,
}

impl Call {
    pub fn new(target: Address, value: U256, data: impl Into<Bytes>) -> Self {
        Self {
            target,
            value,
            data: data.into(),
        }
    }

    /// First four bytes of the call data, if present.
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.data.get(..4).map(|s| [s[0], s[1], s[2], s[3]])
    }
}
