use alloy_primitives::{keccak256, Address, Bytes, B256};

use crate::errors::CodecError;

/// Largest value representable as a Solidity `uint48`.
pub const MAX_UINT48: u64 = (1 << 48) - 1;

/// One entry of the permission tree: a session key's time window, the validation module that
/// polices it and that module's parameters.
///
/// `valid_until == 0` means the grant never expires.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PermissionLeaf {
    pub valid_after: u64,
    pub valid_until: u64,
    pub module: Address,
    pub module_params: Bytes,
}

impl PermissionLeaf {
    /// Packed leaf encoding:
    /// `uint48 validUntil || uint48 validAfter || address module || bytes moduleParams`.
    pub fn encode_packed(&self) -> Result<Vec<u8>, CodecError> {
        let valid_until = uint48_be("validUntil", self.valid_until)?;
        let valid_after = uint48_be("validAfter", self.valid_after)?;

        let mut buf = Vec::with_capacity(6 + 6 + 20 + self.module_params.len());
        buf.extend_from_slice(&valid_until);
        buf.extend_from_slice(&valid_after);
        buf.extend_from_slice(self.module.as_slice());
        buf.extend_from_slice(&self.module_params);
        Ok(buf)
    }

    /// Leaf digest as stored in the permission tree.
    pub fn digest(&self) -> Result<B256, CodecError> {
        Ok(keccak256(self.encode_packed()?))
    }

    /// Whether `now` falls inside `[valid_after, valid_until]` (no upper bound when `valid_until == 0`).
    pub fn is_active_at(&self, now: u64) -> bool {
        self.valid_after <= now && (self.valid_until == 0 || now <= self.valid_until)
    }
}

fn uint48_be(field: &'static str, value: u64) -> Result<[u8; 6], CodecError> {
    if value > MAX_UINT48 {
        return Err(CodecError::Uint48Overflow { field, value });
    }
    let mut out = [0u8; 6];
    out.copy_from_slice(&value.to_be_bytes()[2..]);
    Ok(out)
}
