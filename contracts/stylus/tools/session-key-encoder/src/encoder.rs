use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolValue};
use k256::ecdsa::SigningKey;
use session_key_manager::{
    account::interfaces::{ISessionKeyManager, ISmartAccount},
    operation_hash, signing_digest,
    utils::envelope::ECDSA_SIGNATURE_LEN,
    HashDomain,
};
use session_key_types::{Call, CodecError, Operation, PermissionLeaf, PermissionTree, MAX_UINT48};
use tracing::debug;

use crate::types::{EncoderError, OpContext, OperationDefaults, PartialOperation, SessionGrant};

/// Fill unset fields with [`OperationDefaults`]. `maxFeePerGas` defaults to
/// `base_fee + maxPriorityFeePerGas`. The signature is left empty.
///
/// `callGasLimit` gets its default whenever call data is given, even empty call data. Without
/// call data it is zero.
pub fn fill_operation(partial: PartialOperation, base_fee: U256) -> Operation {
    let defaults = OperationDefaults::default();
    let call_gas_limit = partial.call_gas_limit.unwrap_or(match partial.call_data {
        Some(_) => defaults.call_gas_limit,
        None => U256::ZERO,
    });
    let call_data = partial.call_data.unwrap_or_default();
    let max_priority_fee_per_gas = partial
        .max_priority_fee_per_gas
        .unwrap_or(defaults.max_priority_fee_per_gas);
    let max_fee_per_gas = partial
        .max_fee_per_gas
        .unwrap_or_else(|| base_fee.saturating_add(max_priority_fee_per_gas));

    Operation {
        sender: partial.sender,
        nonce: partial.nonce.unwrap_or_default(),
        init_code: partial.init_code.unwrap_or_default(),
        call_data,
        call_gas_limit,
        verification_gas_limit: partial
            .verification_gas_limit
            .unwrap_or(defaults.verification_gas_limit),
        pre_verification_gas: partial
            .pre_verification_gas
            .unwrap_or(defaults.pre_verification_gas),
        max_fee_per_gas,
        max_priority_fee_per_gas,
        paymaster_and_data: partial.paymaster_and_data.unwrap_or_default(),
        signature: Bytes::new(),
    }
}

/// Sign the EIP-191 message over the operation hash. Returns `r || s || v` with `v` in {27, 28}.
pub fn sign_operation(
    op: &Operation,
    domain: &HashDomain,
    signing_key: &SigningKey,
) -> Result<Vec<u8>, CodecError> {
    let digest = signing_digest(operation_hash(op, domain));
    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(digest.as_slice())
        .map_err(|err| CodecError::Signing(err.to_string()))?;

    let mut sig_bytes = Vec::with_capacity(ECDSA_SIGNATURE_LEN);
    sig_bytes.extend_from_slice(&signature.to_bytes());
    sig_bytes.push(27 + recovery_id.to_byte());
    Ok(sig_bytes)
}

/// Owner envelope: `abi.encode(bytes signature, address ownerModule)`.
pub fn encode_owner(signature: &[u8], owner_module: Address) -> Result<Bytes, CodecError> {
    if signature.len() != ECDSA_SIGNATURE_LEN {
        return Err(CodecError::InvalidSignatureLength(signature.len()));
    }
    Ok((Bytes::copy_from_slice(signature), owner_module)
        .abi_encode_params()
        .into())
}

/// Session envelope: `abi.encode(abi.encode(uint48 validUntil, uint48 validAfter, address
/// module, bytes moduleParams, bytes32[] proof, bytes signature), address manager)`.
pub fn encode_session(signature: &[u8], grant: &SessionGrant) -> Result<Bytes, CodecError> {
    if signature.len() != ECDSA_SIGNATURE_LEN {
        return Err(CodecError::InvalidSignatureLength(signature.len()));
    }
    let leaf = &grant.leaf;
    let inner = (
        uint48("validUntil", leaf.valid_until)?,
        uint48("validAfter", leaf.valid_after)?,
        leaf.module,
        leaf.module_params.clone(),
        grant.proof.clone(),
        Bytes::copy_from_slice(signature),
    )
        .abi_encode_params();
    Ok((Bytes::from(inner), grant.manager).abi_encode_params().into())
}

fn uint48(field: &'static str, value: u64) -> Result<U256, CodecError> {
    if value > MAX_UINT48 {
        return Err(CodecError::Uint48Overflow { field, value });
    }
    Ok(U256::from(value))
}

/// `execute(target, value, data)` call data for the account.
pub fn execute_call_data(target: Address, value: U256, data: impl Into<Bytes>) -> Bytes {
    ISmartAccount::executeCall {
        dest: target,
        value,
        func: data.into(),
    }
    .abi_encode()
    .into()
}

/// `executeBatch(dest[], value[], func[])` call data. The account runs the calls in order and
/// reverts them all if any one fails.
pub fn execute_batch_call_data(calls: &[Call]) -> Bytes {
    ISmartAccount::executeBatchCall {
        dest: calls.iter().map(|call| call.target).collect(),
        value: calls.iter().map(|call| call.value).collect(),
        func: calls.iter().map(|call| call.data.clone()).collect(),
    }
    .abi_encode()
    .into()
}

/// `enableModule(module)` call data. Routed by the account to itself.
pub fn enable_module_call_data(module: Address) -> Bytes {
    ISmartAccount::enableModuleCall { module }.abi_encode().into()
}

/// Fill `partial` and sign it with the account owner.
pub fn make_owner_op(
    partial: PartialOperation,
    ctx: &OpContext,
    owner: &SigningKey,
    owner_module: Address,
) -> Result<Operation, EncoderError> {
    let mut op = fill_operation(partial, ctx.base_fee);
    let signature = sign_operation(&op, &ctx.domain, owner)?;
    op.signature = encode_owner(&signature, owner_module)?;
    Ok(op)
}

/// Fill `partial` and sign it with a session key under `grant`.
pub fn make_session_op(
    partial: PartialOperation,
    ctx: &OpContext,
    session_key: &SigningKey,
    grant: &SessionGrant,
) -> Result<Operation, EncoderError> {
    let mut op = fill_operation(partial, ctx.base_fee);
    let signature = sign_operation(&op, &ctx.domain, session_key)?;
    op.signature = encode_session(&signature, grant)?;
    Ok(op)
}

/// Build the permission tree over `leaves` and an owner-signed operation publishing its root
/// through `manager.setMerkleRoot`. Submitting the operation replaces any previous root.
pub fn enable_new_tree(
    leaves: &[PermissionLeaf],
    account: Address,
    nonce: U256,
    manager: Address,
    ctx: &OpContext,
    owner: &SigningKey,
    owner_module: Address,
) -> Result<(PermissionTree, Operation), EncoderError> {
    let digests = leaves
        .iter()
        .map(PermissionLeaf::digest)
        .collect::<Result<Vec<B256>, _>>()?;
    let tree = PermissionTree::new(digests)?;
    let root = tree.root();
    debug!(%account, %root, leaves = tree.len(), "publishing permission root");

    let set_root = ISessionKeyManager::setMerkleRootCall { root }.abi_encode();
    let call_data = ISmartAccount::execute_ncCCall {
        dest: manager,
        value: U256::ZERO,
        func: set_root.into(),
    }
    .abi_encode();
    let op = make_owner_op(
        PartialOperation::new(account, call_data).with_nonce(nonce),
        ctx,
        owner,
        owner_module,
    )?;
    Ok((tree, op))
}
