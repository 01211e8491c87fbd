//! Shared utilities for the session key manager.

pub mod crypto;
pub mod envelope;
