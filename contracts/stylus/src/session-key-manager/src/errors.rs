use alloy_primitives::{Address, U256};
use thiserror::Error;

/// Errors while decoding the `Operation::signature` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("outer envelope is not abi.encode(bytes, address)")]
    Outer,
    #[error("inner signature matches neither the owner nor the session shape")]
    UnknownShape,
    #[error("{field} does not fit in uint48")]
    Uint48Overflow { field: &'static str },
}

/// Errors while decoding `Operation::call_data` against the account ABI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallDecodeError {
    #[error("call data shorter than a selector")]
    MissingSelector,
    #[error("call data does not match the account ABI")]
    Abi,
    #[error("batch arrays differ in length")]
    BatchLengthMismatch,
}

/// Errors during ECDSA recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecoveryError {
    #[error("expected a 65-byte signature, got {0} bytes")]
    InvalidLength(usize),
    #[error("signature does not recover to a public key")]
    Unrecoverable,
}

/// Terminal reasons an operation is rejected. None of them are retried by the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("malformed signature envelope: {0}")]
    MalformedEnvelope(#[from] EnvelopeError),
    #[error("bad signature")]
    BadSignature,
    #[error("invalid merkle proof")]
    InvalidProof,
    #[error("session expired or not yet valid")]
    Expired,
    #[error("{0}")]
    ModuleDenied(String),
    #[error("unknown module {0}")]
    UnknownModule(Address),
    #[error("malformed call data: {0}")]
    MalformedCall(#[from] CallDecodeError),
    /// Not the next nonce in its sequence: already used, or skips ahead.
    #[error("invalid nonce {0}")]
    InvalidNonce(U256),
}
