use alloy_primitives::Address;
use alloy_sol_types::SolValue;

use super::{
    SessionRequest, SessionValidation, Verdict, DENY_INVALID_PARAMS, DENY_INVALID_SELECTOR,
    DENY_SIGNER_MISMATCH,
};

pub const DENY_WRONG_TARGET: &str = "wrong target contract address";

/// Lets a session key call a fixed set of contracts.
///
/// `moduleParams = abi.encode(address sessionKey, address[] allowedTargets)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContractAddressSessionValidation;

impl ContractAddressSessionValidation {
    pub fn encode_params(session_key: Address, allowed_targets: &[Address]) -> Vec<u8> {
        (session_key, allowed_targets.to_vec()).abi_encode_params()
    }
}

impl SessionValidation for ContractAddressSessionValidation {
    fn validate(&self, module_params: &[u8], request: &SessionRequest<'_>) -> Verdict {
        let Ok((session_key, allowed_targets)) =
            <(Address, Vec<Address>)>::abi_decode_params(module_params, true)
        else {
            return Verdict::deny(DENY_INVALID_PARAMS);
        };
        if request.signer != session_key {
            return Verdict::deny(DENY_SIGNER_MISMATCH);
        }
        let Some(call) = request.call.single() else {
            return Verdict::deny(DENY_INVALID_SELECTOR);
        };
        if !allowed_targets.contains(&call.target) {
            return Verdict::deny(DENY_WRONG_TARGET);
        }
        Verdict::Allow
    }
}
