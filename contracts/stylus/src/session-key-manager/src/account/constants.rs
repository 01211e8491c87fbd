//! ERC-4337 validation data, mirrored from the EntryPoint.

use alloy_primitives::U256;

/// Returned by account validation when the signature is invalid.
pub const SIG_VALIDATION_FAILED: U256 = U256::from_limbs([1, 0, 0, 0]);
pub const SIG_VALIDATION_SUCCESS: U256 = U256::ZERO;

const VALID_UNTIL_SHIFT: usize = 160;
const VALID_AFTER_SHIFT: usize = 208;

/// Time window attached to an accepted operation. All zeros for owner-signed operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValidationData {
    pub valid_after: u64,
    pub valid_until: u64,
}

impl ValidationData {
    /// `sigFailed (0) | validUntil << 160 | validAfter << 208`.
    pub fn pack(&self) -> U256 {
        SIG_VALIDATION_SUCCESS
            | (U256::from(self.valid_until) << VALID_UNTIL_SHIFT)
            | (U256::from(self.valid_after) << VALID_AFTER_SHIFT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_layout() {
        assert_eq!(ValidationData::default().pack(), U256::ZERO);

        let packed = ValidationData {
            valid_after: 7,
            valid_until: 9,
        }
        .pack();
        assert_eq!(packed >> VALID_AFTER_SHIFT, U256::from(7u64));
        assert_eq!(
            (packed >> VALID_UNTIL_SHIFT) & U256::from(0xffff_ffff_ffffu64),
            U256::from(9u64)
        );
        assert_eq!(packed & U256::from(1u64), U256::ZERO);
    }
}
