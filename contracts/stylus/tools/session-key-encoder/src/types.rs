use alloy_primitives::{Address, Bytes, B256, U256};
use session_key_manager::HashDomain;
use session_key_types::{CodecError, PermissionLeaf, PermissionTree, TreeError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncoderError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Where signed operations are going to be verified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpContext {
    pub domain: HashDomain,
    /// Current base fee, used to derive `maxFeePerGas` when it is not given.
    pub base_fee: U256,
}

/// An operation before defaults are filled in. `None` fields take [`OperationDefaults`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartialOperation {
    pub sender: Address,
    pub nonce: Option<U256>,
    pub init_code: Option<Bytes>,
    pub call_data: Option<Bytes>,
    pub call_gas_limit: Option<U256>,
    pub verification_gas_limit: Option<U256>,
    pub pre_verification_gas: Option<U256>,
    pub max_fee_per_gas: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
    pub paymaster_and_data: Option<Bytes>,
}

impl PartialOperation {
    pub fn new(sender: Address, call_data: impl Into<Bytes>) -> Self {
        Self {
            sender,
            call_data: Some(call_data.into()),
            ..Default::default()
        }
    }

    pub fn with_nonce(mut self, nonce: U256) -> Self {
        self.nonce = Some(nonce);
        self
    }
}

/// Gas defaults used when filling an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OperationDefaults {
    /// Only applied when the operation carries call data.
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    /// Should also cover calldata cost.
    pub pre_verification_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

impl Default for OperationDefaults {
    fn default() -> Self {
        Self {
            call_gas_limit: U256::from(3_000_000u64),
            verification_gas_limit: U256::from(250_000u64),
            pre_verification_gas: U256::from(21_000u64),
            max_priority_fee_per_gas: U256::from(1_000_000_000u64),
        }
    }
}

/// Everything a session key needs besides its private key: which leaf it was granted, the
/// proof of that leaf against the published root, and the manager the account routes through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionGrant {
    pub manager: Address,
    pub leaf: PermissionLeaf,
    pub proof: Vec<B256>,
}

impl SessionGrant {
    /// Look `leaf` up in `tree` and attach its proof.
    pub fn from_tree(
        tree: &PermissionTree,
        leaf: PermissionLeaf,
        manager: Address,
    ) -> Result<Self, EncoderError> {
        let proof = tree.proof(leaf.digest()?)?;
        Ok(Self {
            manager,
            leaf,
            proof,
        })
    }
}
