//! Shared types for operations, permission leaves, signature envelopes and the permission tree.
//!
//! Everything here is used by both the verifying side (`session-key-manager`) and the signing
//! side (`session-key-encoder`), so digests computed on either side always agree.

pub mod envelope;
pub mod errors;
pub mod executor;
pub mod leaf;
pub mod merkle;
pub mod operation;

pub use envelope::{OwnerSignature, SessionSignature, SignatureEnvelope};
pub use errors::{CodecError, ExecutorError, TreeError};
pub use executor::{split_nonce, Executor};
pub use leaf::{PermissionLeaf, MAX_UINT48};
pub use merkle::{hash_pair, verify_proof, PermissionTree};
pub use operation::{Call, Operation};
