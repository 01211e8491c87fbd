use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolInterface;
use session_key_types::Call;

use crate::{account::interfaces::ISmartAccount::ISmartAccountCalls, errors::CallDecodeError};

/// What an operation's call data asks the account to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountCall {
    /// Empty call data: validation only, nothing to execute.
    Empty,
    /// `execute` / `execute_ncC`.
    Single(Call),
    /// `executeBatch` / `executeBatch_y6U`.
    Batch(Vec<Call>),
    /// Any other account method (e.g. `enableModule`); executed as a call from the account to itself.
    SelfCall(Bytes),
}

impl AccountCall {
    /// The call when exactly one external call is requested.
    pub fn single(&self) -> Option<&Call> {
        match self {
            Self::Single(call) => Some(call),
            _ => None,
        }
    }
}

/// Decode `Operation::call_data` against the smart account ABI.
pub fn decode_account_call(data: &[u8]) -> Result<AccountCall, CallDecodeError> {
    if data.is_empty() {
        return Ok(AccountCall::Empty);
    }
    if data.len() < 4 {
        return Err(CallDecodeError::MissingSelector);
    }

    let selector = [data[0], data[1], data[2], data[3]];
    if !ISmartAccountCalls::valid_selector(selector) {
        return Ok(AccountCall::SelfCall(Bytes::copy_from_slice(data)));
    }

    let decoded = ISmartAccountCalls::abi_decode(data, true).map_err(|_| CallDecodeError::Abi)?;
    let call = match decoded {
        ISmartAccountCalls::execute(c) => AccountCall::Single(Call::new(c.dest, c.value, c.func)),
        ISmartAccountCalls::execute_ncC(c) => {
            AccountCall::Single(Call::new(c.dest, c.value, c.func))
        }
        ISmartAccountCalls::executeBatch(c) => batch(c.dest, c.value, c.func)?,
        ISmartAccountCalls::executeBatch_y6U(c) => batch(c.dest, c.value, c.func)?,
        ISmartAccountCalls::enableModule(_) => AccountCall::SelfCall(Bytes::copy_from_slice(data)),
    };
    Ok(call)
}

fn batch(
    dest: Vec<Address>,
    value: Vec<U256>,
    func: Vec<Bytes>,
) -> Result<AccountCall, CallDecodeError> {
    // An empty value array means "no value" for every call.
    if dest.len() != func.len() || (!value.is_empty() && value.len() != dest.len()) {
        return Err(CallDecodeError::BatchLengthMismatch);
    }
    let calls = dest
        .into_iter()
        .zip(func)
        .enumerate()
        .map(|(i, (target, data))| Call::new(target, value.get(i).copied().unwrap_or_default(), data))
        .collect();
    Ok(AccountCall::Batch(calls))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::interfaces::{IERC721, ISmartAccount};
    use alloy_sol_types::SolCall;

    #[test]
    fn test_decode_execute_variants() {
        let inner = IERC721::setApprovalForAllCall {
            operator: Address::with_last_byte(2),
            approved: true,
        }
        .abi_encode();
        let target = Address::with_last_byte(1);

        let execute = ISmartAccount::executeCall {
            dest: target,
            value: U256::ZERO,
            func: inner.clone().into(),
        }
        .abi_encode();
        let ncc = ISmartAccount::execute_ncCCall {
            dest: target,
            value: U256::from(5u64),
            func: inner.clone().into(),
        }
        .abi_encode();

        assert_eq!(
            decode_account_call(&execute).unwrap(),
            AccountCall::Single(Call::new(target, U256::ZERO, inner.clone()))
        );
        assert_eq!(
            decode_account_call(&ncc).unwrap().single().map(|c| c.value),
            Some(U256::from(5u64))
        );
    }

    #[test]
    fn test_decode_batch() {
        let data = ISmartAccount::executeBatchCall {
            dest: vec![Address::with_last_byte(1), Address::with_last_byte(2)],
            value: vec![],
            func: vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")],
        }
        .abi_encode();
        match decode_account_call(&data).unwrap() {
            AccountCall::Batch(calls) => {
                assert_eq!(calls.len(), 2);
                assert_eq!(calls[1].target, Address::with_last_byte(2));
                assert_eq!(calls[1].value, U256::ZERO);
            }
            other => panic!("unexpected {other:?}"),
        }

        let mismatched = ISmartAccount::executeBatch_y6UCall {
            dest: vec![Address::with_last_byte(1)],
            value: vec![U256::ZERO, U256::ZERO],
            func: vec![Bytes::new()],
        }
        .abi_encode();
        assert_eq!(
            decode_account_call(&mismatched),
            Err(CallDecodeError::BatchLengthMismatch)
        );
    }

    #[test]
    fn test_decode_self_calls_and_garbage() {
        let enable = ISmartAccount::enableModuleCall {
            module: Address::with_last_byte(9),
        }
        .abi_encode();
        assert_eq!(
            decode_account_call(&enable).unwrap(),
            AccountCall::SelfCall(enable.clone().into())
        );
        assert_eq!(decode_account_call(&[]).unwrap(), AccountCall::Empty);
        assert_eq!(decode_account_call(&[1, 2]), Err(CallDecodeError::MissingSelector));

        let truncated = &ISmartAccount::executeCall::SELECTOR[..];
        assert_eq!(decode_account_call(truncated), Err(CallDecodeError::Abi));
    }
}
