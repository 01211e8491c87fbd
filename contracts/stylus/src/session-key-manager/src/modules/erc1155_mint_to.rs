use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolValue};

use super::{
    SessionRequest, SessionValidation, Verdict, DENY_INVALID_PARAMS, DENY_INVALID_SELECTOR,
    DENY_SIGNER_MISMATCH,
};
use crate::account::interfaces::IERC1155MintTo::mintToCall;

pub const DENY_WRONG_TOKEN: &str = "ERC1155MT Wrong Token";
pub const DENY_NON_ZERO_VALUE: &str = "ERC1155MT Non Zero Value";
pub const DENY_WRONG_SELECTOR: &str = "ERC1155MT Wrong Selector";
pub const DENY_WRONG_RECIPIENT: &str = "ERC1155MT Wrong Recipient";
pub const DENY_WRONG_TOKEN_ID: &str = "ERC1155MT Wrong Token Id";

/// Lets a session key mint one ERC-1155 token id to one recipient.
///
/// `moduleParams = abi.encode(address sessionKey, address recipient, uint256 tokenId, address token)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Erc1155MintToSessionValidation;

impl Erc1155MintToSessionValidation {
    pub fn encode_params(
        session_key: Address,
        recipient: Address,
        token_id: U256,
        token: Address,
    ) -> Vec<u8> {
        (session_key, recipient, token_id, token).abi_encode_params()
    }
}

impl SessionValidation for Erc1155MintToSessionValidation {
    fn validate(&self, module_params: &[u8], request: &SessionRequest<'_>) -> Verdict {
        let Ok((session_key, recipient, token_id, token)) =
            <(Address, Address, U256, Address)>::abi_decode_params(module_params, true)
        else {
            return Verdict::deny(DENY_INVALID_PARAMS);
        };
        if request.signer != session_key {
            return Verdict::deny(DENY_SIGNER_MISMATCH);
        }
        let Some(call) = request.call.single() else {
            return Verdict::deny(DENY_INVALID_SELECTOR);
        };
        if call.target != token {
            return Verdict::deny(DENY_WRONG_TOKEN);
        }
        if !call.value.is_zero() {
            return Verdict::deny(DENY_NON_ZERO_VALUE);
        }
        let Ok(mint) = mintToCall::abi_decode(&call.data, true) else {
            return Verdict::deny(DENY_WRONG_SELECTOR);
        };
        if mint.to != recipient {
            return Verdict::deny(DENY_WRONG_RECIPIENT);
        }
        if mint.id != token_id {
            return Verdict::deny(DENY_WRONG_TOKEN_ID);
        }
        Verdict::Allow
    }
}
