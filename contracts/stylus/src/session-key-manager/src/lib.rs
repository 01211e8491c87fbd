//! Session key manager for smart accounts.
//!
//! Accounts accept operations signed either by their owner or by a session key. A session key's
//! authority is one leaf of a Merkle tree whose root the owner publishes; each leaf names a
//! time window and a validation module that restricts what the key may call.

pub mod account;
pub mod decoder;
pub mod errors;
pub mod modules;
pub mod user_op;
pub mod utils;
pub mod verifier;

pub use account::constants::{ValidationData, SIG_VALIDATION_FAILED, SIG_VALIDATION_SUCCESS};
pub use decoder::{decode_account_call, AccountCall};
pub use errors::{CallDecodeError, EnvelopeError, RecoveryError, Rejection};
pub use modules::{
    ContractAddressSessionValidation, Erc1155MintToSessionValidation, ModuleRegistry,
    SessionRequest, SessionValidation, ValidationModule, Verdict,
};
pub use user_op::{encode_for_accounting, encode_for_hash, operation_hash, HashDomain};
pub use utils::{
    crypto::{address_of, ecrecover_address, signing_digest},
    envelope::decode_envelope,
};
pub use verifier::{DelegationVerifier, OpReceipt};
