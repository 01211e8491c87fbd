//! `Operation::signature` envelope parsing.
//!
//! Outer layout: `abi.encode(bytes inner, address module)`.
//! - Owner shape: `inner` is a bare 65-byte ECDSA signature and `module` is the ownership module.
//! - Session shape: `inner` is `abi.encode(uint48 validUntil, uint48 validAfter, address module,
//!   bytes moduleParams, bytes32[] proof, bytes signature)` and `module` is the session key manager.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolValue;
use session_key_types::{OwnerSignature, SessionSignature, SignatureEnvelope, MAX_UINT48};

use crate::errors::EnvelopeError;

pub const ECDSA_SIGNATURE_LEN: usize = 65;

/// `uint48` words are decoded as `uint256` and range-checked; the ABI word is the same.
type SessionPayload = (U256, U256, Address, Bytes, Vec<B256>, Bytes);

/// Decode the signature envelope by matching the owner shape, then the session shape.
pub fn decode_envelope(sig: &[u8]) -> Result<SignatureEnvelope, EnvelopeError> {
    let outer = <(Bytes, Address)>::abi_decode_params(sig, true).map_err(|_| EnvelopeError::Outer)?;
    // Reject non-canonical encodings (trailing bytes, odd offsets) for determinism.
    if outer.abi_encode_params() != sig {
        return Err(EnvelopeError::Outer);
    }
    let (inner, module) = outer;

    if inner.len() == ECDSA_SIGNATURE_LEN {
        return Ok(SignatureEnvelope::Owner(OwnerSignature {
            signature: inner,
            owner_module: module,
        }));
    }

    let payload = SessionPayload::abi_decode_params(&inner, true)
        .map_err(|_| EnvelopeError::UnknownShape)?;
    if payload.abi_encode_params() != &inner[..] {
        return Err(EnvelopeError::UnknownShape);
    }
    let (valid_until, valid_after, session_module, module_params, proof, signature) = payload;

    Ok(SignatureEnvelope::Session(SessionSignature {
        signature,
        valid_after: uint48("validAfter", valid_after)?,
        valid_until: uint48("validUntil", valid_until)?,
        module: session_module,
        module_params,
        proof,
        manager: module,
    }))
}

fn uint48(field: &'static str, word: U256) -> Result<u64, EnvelopeError> {
    if word > U256::from(MAX_UINT48) {
        return Err(EnvelopeError::Uint48Overflow { field });
    }
    Ok(word.to::<u64>())
}
