//! Cryptographic helpers used by the manager.
//!
//! Recovers the signer of an operation digest so it can be compared against the owner or
//! handed to a session validation module.

use alloy_primitives::{eip191_hash_message, keccak256, Address, B256};
use k256::{
    ecdsa::{RecoveryId, Signature, VerifyingKey},
    elliptic_curve::sec1::ToEncodedPoint,
};

use crate::errors::RecoveryError;

/// Digest that owners and session keys actually sign:
/// `keccak256("\x19Ethereum Signed Message:\n32" || op_hash)`.
pub fn signing_digest(op_hash: B256) -> B256 {
    eip191_hash_message(op_hash)
}

/// Ethereum address of a secp256k1 public key.
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.as_affine().to_encoded_point(false);
    // Skip the 0x04 SEC1 tag; the address is the low 20 bytes of the hash.
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Signer of `digest` given `r || s || v`. `v` may be 0/1 or 27/28; any other `v` tries both
/// parities.
pub fn ecrecover_address(digest: B256, sig: &[u8]) -> Result<Address, RecoveryError> {
    if sig.len() != 65 {
        return Err(RecoveryError::InvalidLength(sig.len()));
    }
    let signature = Signature::from_slice(&sig[..64]).map_err(|_| RecoveryError::Unrecoverable)?;

    let candidates: &[u8] = match sig[64] {
        27 | 0 => &[0],
        28 | 1 => &[1],
        _ => &[0, 1],
    };

    for parity in candidates {
        let Some(recovery_id) = RecoveryId::from_byte(*parity) else {
            continue;
        };
        if let Ok(key) = VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, recovery_id) {
            return Ok(address_of(&key));
        }
    }

    Err(RecoveryError::Unrecoverable)
}
