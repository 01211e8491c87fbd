use alloy_primitives::{Address, Bytes, B256, U256};

use crate::errors::ExecutorError;

/// Split an ERC-4337 nonce into its 192-bit sequence key and 64-bit sequence number.
pub fn split_nonce(nonce: U256) -> (U256, u64) {
    (nonce >> 64, nonce.as_limbs()[0])
}

/// Executor abstraction: account storage, call execution and the clock.
///
/// Implemented by whatever actually runs accounts (an EVM host, or the in-memory mock used
/// off-chain). Verification only does single-shot reads through this trait; nonces, roots and
/// call effects are written only after an operation is accepted.
pub trait Executor {
    /// State captured by [`Executor::snapshot`].
    type Snapshot;

    /// Current permission root of `account`. `B256::ZERO` when none has been published.
    fn stored_root(&self, account: Address) -> B256;

    /// Replace the permission root of `account`. Proofs against the previous root stop verifying.
    fn set_stored_root(&mut self, account: Address, root: B256) -> Result<(), ExecutorError>;

    /// Next nonce of `account` in sequence `key`, as `key << 64 | seq` (`EntryPoint.getNonce`).
    fn get_nonce(&self, account: Address, key: U256) -> U256;

    /// Consume `nonce` if it is the next one in its sequence. Returns `false` and changes
    /// nothing otherwise.
    fn use_nonce(&mut self, account: Address, nonce: U256) -> bool;

    /// Perform `target.call{value}(data)` as `account`.
    fn execute_call(
        &mut self,
        account: Address,
        target: Address,
        value: U256,
        data: &[u8],
    ) -> Result<Bytes, ExecutorError>;

    /// Capture every effect [`Executor::execute_call`] can have.
    fn snapshot(&self) -> Self::Snapshot;

    /// Undo every effect since `snapshot` was taken.
    fn revert_to(&mut self, snapshot: Self::Snapshot);

    /// Block timestamp used for session time windows.
    fn current_time(&self) -> u64;

    /// Owner registered for `account` in `owner_module`, if that module is installed.
    fn owner_of(&self, account: Address, owner_module: Address) -> Option<Address>;

    /// Whether `account` has enabled `module`.
    fn is_module_enabled(&self, account: Address, module: Address) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_nonce() {
        assert_eq!(split_nonce(U256::ZERO), (U256::ZERO, 0));
        assert_eq!(split_nonce(U256::from(7u64)), (U256::ZERO, 7));

        let keyed = (U256::from(3u64) << 64) | U256::from(u64::MAX);
        assert_eq!(split_nonce(keyed), (U256::from(3u64), u64::MAX));
    }
}
