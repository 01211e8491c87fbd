use alloy_primitives::Address;

/// Errors while building or querying a [`PermissionTree`](crate::PermissionTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("cannot build a permission tree without leaves")]
    EmptyTree,
    #[error("leaf is not part of the permission tree")]
    LeafNotFound,
    #[error("leaf index {index} out of range for a tree of {len} leaves")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Errors while encoding protocol values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// A `uint48` field (`validAfter` / `validUntil`) does not fit in 48 bits.
    #[error("{field} = {value} exceeds uint48")]
    Uint48Overflow { field: &'static str, value: u64 },
    /// ECDSA signatures are always `r || s || v`.
    #[error("expected a 65-byte signature, got {0} bytes")]
    InvalidSignatureLength(usize),
    #[error("signing failed: {0}")]
    Signing(String),
}

/// Errors surfaced by an [`Executor`](crate::Executor) implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutorError {
    /// The call target has no code the executor knows how to run.
    #[error("no contract deployed at {0}")]
    UnknownTarget(Address),
    /// The target rejected the call.
    #[error("call to {target} reverted: {reason}")]
    Reverted { target: Address, reason: String },
}
