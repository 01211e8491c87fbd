//! Session validation modules.
//!
//! A module decides whether a session key may authorise a particular call. Modules are a closed
//! set of variants behind [`ValidationModule`], addressed through a [`ModuleRegistry`]; an
//! address without a registered module is rejected, never defaulted.

use std::collections::BTreeMap;

use alloy_primitives::Address;

use crate::{decoder::AccountCall, errors::Rejection};

pub mod contract_address;
pub mod erc1155_mint_to;

pub use contract_address::ContractAddressSessionValidation;
pub use erc1155_mint_to::Erc1155MintToSessionValidation;

pub const DENY_SIGNER_MISMATCH: &str = "session key signer mismatch";
pub const DENY_INVALID_SELECTOR: &str = "invalid selector";
pub const DENY_INVALID_PARAMS: &str = "invalid session key data";

/// Result of a module check.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(String),
}

impl Verdict {
    pub fn deny(reason: impl Into<String>) -> Self {
        Self::Deny(reason.into())
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// What a module gets to look at besides its own parameters.
#[derive(Clone, Copy, Debug)]
pub struct SessionRequest<'a> {
    /// Address recovered from the session signature over the operation digest.
    pub signer: Address,
    pub call: &'a AccountCall,
}

/// Shared capability of all session validation modules.
pub trait SessionValidation {
    fn validate(&self, module_params: &[u8], request: &SessionRequest<'_>) -> Verdict;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationModule {
    ContractAddress(ContractAddressSessionValidation),
    Erc1155MintTo(Erc1155MintToSessionValidation),
}

impl SessionValidation for ValidationModule {
    fn validate(&self, module_params: &[u8], request: &SessionRequest<'_>) -> Verdict {
        match self {
            Self::ContractAddress(module) => module.validate(module_params, request),
            Self::Erc1155MintTo(module) => module.validate(module_params, request),
        }
    }
}

impl From<ContractAddressSessionValidation> for ValidationModule {
    fn from(module: ContractAddressSessionValidation) -> Self {
        Self::ContractAddress(module)
    }
}

impl From<Erc1155MintToSessionValidation> for ValidationModule {
    fn from(module: Erc1155MintToSessionValidation) -> Self {
        Self::Erc1155MintTo(module)
    }
}

/// Address-keyed lookup of deployed validation modules.
#[derive(Clone, Debug, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<Address, ValidationModule>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `module` at `address`, returning whatever was there before.
    pub fn register(
        &mut self,
        address: Address,
        module: impl Into<ValidationModule>,
    ) -> Option<ValidationModule> {
        self.modules.insert(address, module.into())
    }

    pub fn with(mut self, address: Address, module: impl Into<ValidationModule>) -> Self {
        self.register(address, module);
        self
    }

    pub fn get(&self, address: Address) -> Result<&ValidationModule, Rejection> {
        self.modules
            .get(&address)
            .ok_or(Rejection::UnknownModule(address))
    }

    pub fn contains(&self, address: Address) -> bool {
        self.modules.contains_key(&address)
    }
}
