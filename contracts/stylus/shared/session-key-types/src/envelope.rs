use alloy_primitives::{Address, Bytes, B256};

use crate::leaf::PermissionLeaf;

/// Decoded contents of `Operation::signature`.
///
/// Both shapes share the outer `abi.encode(bytes inner, address module)` wrapper; the inner
/// blob tells them apart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignatureEnvelope {
    Owner(OwnerSignature),
    Session(SessionSignature),
}

/// The account owner signed the operation directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerSignature {
    /// 65-byte ECDSA signature over the EIP-191 operation digest.
    pub signature: Bytes,
    /// Ownership module that knows the account's owner.
    pub owner_module: Address,
}

/// A session key signed the operation under a leaf of the stored permission tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSignature {
    pub signature: Bytes,
    pub valid_after: u64,
    pub valid_until: u64,
    /// Session validation module named by the leaf.
    pub module: Address,
    pub module_params: Bytes,
    pub proof: Vec<B256>,
    /// Session key manager the account routes the operation through.
    pub manager: Address,
}

impl SessionSignature {
    /// The permission leaf this signature claims membership of.
    pub fn leaf(&self) -> PermissionLeaf {
        PermissionLeaf {
            valid_after: self.valid_after,
            valid_until: self.valid_until,
            module: self.module,
            module_params: self.module_params.clone(),
        }
    }
}

impl SignatureEnvelope {
    /// The raw ECDSA signature carried by either shape.
    pub fn inner_signature(&self) -> &Bytes {
        match self {
            Self::Owner(owner) => &owner.signature,
            Self::Session(session) => &session.signature,
        }
    }
}
