//! Smart account compatibility shims.
//!
//! ABI surface of the account, the session key manager and the token contracts session keys
//! talk to, plus the ERC-4337 validation-data encoding.

pub mod constants;
pub mod interfaces;
