//! Delegation verifier: decides whether an operation is authorised by the account owner or by
//! a session key granted through the account's permission tree.
//!
//! Flow:
//! - hash the operation and decode its signature envelope;
//! - owner path: the recovered signer must be the owner registered in the named ownership module;
//! - session path: the leaf rebuilt from the envelope must prove into the stored root, the time
//!   window must contain `now`, and the named validation module must allow the call. The module,
//!   not the verifier, compares the recovered signer against the session key.
//!
//! The stored root and the clock are read once per verification and passed down explicitly, so
//! a root replaced mid-flight only ever makes a stale proof fail.

use alloy_primitives::{Address, B256, U256};
use session_key_types::{
    verify_proof, Executor, Operation, OwnerSignature, SessionSignature, SignatureEnvelope,
};
use tracing::{debug, trace};

use crate::{
    account::constants::{ValidationData, SIG_VALIDATION_FAILED},
    decoder::{decode_account_call, AccountCall},
    errors::Rejection,
    modules::{ModuleRegistry, SessionRequest, SessionValidation, Verdict},
    user_op::{operation_hash, HashDomain},
    utils::{
        crypto::{ecrecover_address, signing_digest},
        envelope::decode_envelope,
    },
};

/// Outcome of [`DelegationVerifier::handle_op`] for an accepted operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpReceipt {
    pub op_hash: B256,
    pub validation: ValidationData,
    /// Whether every requested call executed. Validation already succeeded either way.
    pub success: bool,
    pub revert_reason: Option<String>,
}

#[derive(Clone, Debug)]
pub struct DelegationVerifier {
    /// Address under which accounts enable this session key manager.
    session_manager: Address,
    domain: HashDomain,
    modules: ModuleRegistry,
}

impl DelegationVerifier {
    pub fn new(session_manager: Address, domain: HashDomain, modules: ModuleRegistry) -> Self {
        Self {
            session_manager,
            domain,
            modules,
        }
    }

    pub fn session_manager(&self) -> Address {
        self.session_manager
    }

    pub fn domain(&self) -> &HashDomain {
        &self.domain
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    /// Verify `op` against the executor's current view of its sender account.
    pub fn validate_operation<E: Executor + ?Sized>(
        &self,
        op: &Operation,
        executor: &E,
    ) -> Result<ValidationData, Rejection> {
        let result = self.validate_inner(op, executor);
        match &result {
            Ok(data) => debug!(
                sender = %op.sender,
                valid_after = data.valid_after,
                valid_until = data.valid_until,
                "operation accepted"
            ),
            Err(reason) => debug!(sender = %op.sender, %reason, "operation rejected"),
        }
        result
    }

    fn validate_inner<E: Executor + ?Sized>(
        &self,
        op: &Operation,
        executor: &E,
    ) -> Result<ValidationData, Rejection> {
        let op_hash = operation_hash(op, &self.domain);
        trace!(%op_hash, "hash computed");

        let envelope = decode_envelope(&op.signature)?;
        let digest = signing_digest(op_hash);

        match envelope {
            SignatureEnvelope::Owner(owner) => {
                trace!(module = %owner.owner_module, "owner path");
                self.check_owner(op.sender, digest, &owner, executor)
            }
            SignatureEnvelope::Session(session) => {
                trace!(manager = %session.manager, module = %session.module, "session path");
                if session.manager != self.session_manager
                    || !executor.is_module_enabled(op.sender, session.manager)
                {
                    return Err(Rejection::UnknownModule(session.manager));
                }
                let signer = ecrecover_address(digest, &session.signature)
                    .map_err(|_| Rejection::BadSignature)?;
                self.check_session(
                    &session,
                    signer,
                    &op.call_data,
                    executor.stored_root(op.sender),
                    executor.current_time(),
                )
            }
        }
    }

    fn check_owner<E: Executor + ?Sized>(
        &self,
        account: Address,
        digest: B256,
        owner: &OwnerSignature,
        executor: &E,
    ) -> Result<ValidationData, Rejection> {
        let registered = executor
            .owner_of(account, owner.owner_module)
            .ok_or(Rejection::UnknownModule(owner.owner_module))?;
        let signer =
            ecrecover_address(digest, &owner.signature).map_err(|_| Rejection::BadSignature)?;
        if signer != registered {
            return Err(Rejection::BadSignature);
        }
        Ok(ValidationData::default())
    }

    /// Session checks against an explicit root and clock: proof, then time window, then module.
    pub fn check_session(
        &self,
        session: &SessionSignature,
        signer: Address,
        call_data: &[u8],
        stored_root: B256,
        now: u64,
    ) -> Result<ValidationData, Rejection> {
        let leaf = session.leaf();
        // A leaf that cannot be encoded cannot be in any tree.
        let leaf_digest = leaf.digest().map_err(|_| Rejection::InvalidProof)?;
        if !verify_proof(stored_root, leaf_digest, &session.proof) {
            return Err(Rejection::InvalidProof);
        }
        trace!(%leaf_digest, "proof checked");

        if !leaf.is_active_at(now) {
            return Err(Rejection::Expired);
        }
        trace!(now, "time checked");

        let module = self.modules.get(session.module)?;
        let call = decode_account_call(call_data)?;
        let request = SessionRequest {
            signer,
            call: &call,
        };
        match module.validate(&session.module_params, &request) {
            Verdict::Allow => Ok(ValidationData {
                valid_after: session.valid_after,
                valid_until: session.valid_until,
            }),
            Verdict::Deny(reason) => Err(Rejection::ModuleDenied(reason)),
        }
    }

    /// ERC-4337 style result: a bad signature is reported as `SIG_VALIDATION_FAILED`, every
    /// other rejection is an error.
    pub fn validation_data<E: Executor + ?Sized>(
        &self,
        op: &Operation,
        executor: &E,
    ) -> Result<U256, Rejection> {
        match self.validate_operation(op, executor) {
            Ok(data) => Ok(data.pack()),
            Err(Rejection::BadSignature) => Ok(SIG_VALIDATION_FAILED),
            Err(other) => Err(other),
        }
    }

    /// Verify `op`, consume its nonce, then execute its calls through `executor`.
    ///
    /// Nothing is written for a rejected operation. Once accepted the nonce stays consumed, but
    /// the calls are all-or-nothing: a revert anywhere rolls back every earlier call.
    pub fn handle_op<E: Executor>(
        &self,
        op: &Operation,
        executor: &mut E,
    ) -> Result<OpReceipt, Rejection> {
        let validation = self.validate_operation(op, &*executor)?;
        let call = decode_account_call(&op.call_data)?;

        let account = op.sender;
        if !executor.use_nonce(account, op.nonce) {
            debug!(sender = %account, nonce = %op.nonce, "operation rejected: invalid nonce");
            return Err(Rejection::InvalidNonce(op.nonce));
        }

        let snapshot = executor.snapshot();
        let executed = match call {
            AccountCall::Empty => Ok(()),
            AccountCall::Single(call) => executor
                .execute_call(account, call.target, call.value, &call.data)
                .map(drop),
            AccountCall::Batch(calls) => calls.iter().try_for_each(|call| {
                executor
                    .execute_call(account, call.target, call.value, &call.data)
                    .map(drop)
            }),
            AccountCall::SelfCall(data) => executor
                .execute_call(account, account, U256::ZERO, &data)
                .map(drop),
        };

        if let Err(err) = &executed {
            debug!(sender = %account, %err, "operation execution reverted");
            executor.revert_to(snapshot);
        }
        Ok(OpReceipt {
            op_hash: operation_hash(op, &self.domain),
            validation,
            success: executed.is_ok(),
            revert_reason: executed.err().map(|err| err.to_string()),
        })
    }
}
