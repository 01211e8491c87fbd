//! In-memory executor for off-chain testing.
//!
//! Models just enough chain state to run operations end to end: accounts with their
//! ownership modules, enabled modules and keyed nonces, session key managers holding one root
//! per account, ERC-721 operator approvals and ERC-1155 balances. Snapshots are full clones.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use session_key_manager::account::interfaces::{
    IERC1155MintTo, IERC721, ISessionKeyManager, ISmartAccount,
};
use session_key_types::{split_nonce, Executor, ExecutorError};
use tracing::trace;

#[derive(Clone, Debug, Default)]
pub struct MockExecutor {
    pub block_timestamp: u64,
    owners: BTreeMap<(Address, Address), Address>,
    enabled_modules: BTreeMap<Address, BTreeSet<Address>>,
    roots: BTreeMap<Address, B256>,
    managers: BTreeSet<Address>,
    /// (account, key) -> next sequence number.
    nonces: BTreeMap<(Address, U256), u64>,
    /// nft -> (owner, operator) pairs with approval set.
    approvals: BTreeMap<Address, BTreeSet<(Address, Address)>>,
    /// token -> (holder, id) -> balance.
    balances: BTreeMap<Address, BTreeMap<(Address, U256), U256>>,
}

impl MockExecutor {
    pub fn new(block_timestamp: u64) -> Self {
        Self {
            block_timestamp,
            ..Default::default()
        }
    }

    /// Register `account` with `owner` installed in `owner_module`.
    pub fn create_account(&mut self, account: Address, owner_module: Address, owner: Address) {
        self.owners.insert((account, owner_module), owner);
        self.enabled_modules.entry(account).or_default();
    }

    pub fn deploy_session_manager(&mut self, manager: Address) {
        self.managers.insert(manager);
    }

    pub fn deploy_erc721(&mut self, nft: Address) {
        self.approvals.entry(nft).or_default();
    }

    pub fn deploy_erc1155(&mut self, token: Address) {
        self.balances.entry(token).or_default();
    }

    pub fn is_approved_for_all(&self, nft: Address, owner: Address, operator: Address) -> bool {
        self.approvals
            .get(&nft)
            .is_some_and(|set| set.contains(&(owner, operator)))
    }

    pub fn balance_of(&self, token: Address, holder: Address, id: U256) -> U256 {
        self.balances
            .get(&token)
            .and_then(|balances| balances.get(&(holder, id)))
            .copied()
            .unwrap_or_default()
    }

    fn account_call(&mut self, account: Address, data: &[u8]) -> Result<(), ExecutorError> {
        let call = ISmartAccount::enableModuleCall::abi_decode(data, true)
            .map_err(|_| reverted(account, "unsupported account call"))?;
        self.enabled_modules
            .entry(account)
            .or_default()
            .insert(call.module);
        trace!(%account, module = %call.module, "module enabled");
        Ok(())
    }

    fn manager_call(
        &mut self,
        account: Address,
        manager: Address,
        data: &[u8],
    ) -> Result<(), ExecutorError> {
        let call = ISessionKeyManager::setMerkleRootCall::abi_decode(data, true)
            .map_err(|_| reverted(manager, "unsupported manager call"))?;
        self.set_stored_root(account, call.root)
    }

    fn nft_call(&mut self, account: Address, nft: Address, data: &[u8]) -> Result<(), ExecutorError> {
        let call = IERC721::setApprovalForAllCall::abi_decode(data, true)
            .map_err(|_| reverted(nft, "unsupported ERC721 call"))?;
        let approvals = self.approvals.entry(nft).or_default();
        if call.approved {
            approvals.insert((account, call.operator));
        } else {
            approvals.remove(&(account, call.operator));
        }
        Ok(())
    }

    fn erc1155_call(&mut self, token: Address, data: &[u8]) -> Result<(), ExecutorError> {
        let call = IERC1155MintTo::mintToCall::abi_decode(data, true)
            .map_err(|_| reverted(token, "unsupported ERC1155 call"))?;
        let balance = self
            .balances
            .entry(token)
            .or_default()
            .entry((call.to, call.id))
            .or_default();
        *balance = balance
            .checked_add(call.amount)
            .ok_or_else(|| reverted(token, "balance overflow"))?;
        Ok(())
    }
}

fn reverted(target: Address, reason: &str) -> ExecutorError {
    ExecutorError::Reverted {
        target,
        reason: reason.to_string(),
    }
}

impl Executor for MockExecutor {
    type Snapshot = MockExecutor;

    fn stored_root(&self, account: Address) -> B256 {
        self.roots.get(&account).copied().unwrap_or_default()
    }

    fn set_stored_root(&mut self, account: Address, root: B256) -> Result<(), ExecutorError> {
        trace!(%account, %root, "root stored");
        self.roots.insert(account, root);
        Ok(())
    }

    fn get_nonce(&self, account: Address, key: U256) -> U256 {
        let seq = self.nonces.get(&(account, key)).copied().unwrap_or_default();
        (key << 64) | U256::from(seq)
    }

    fn use_nonce(&mut self, account: Address, nonce: U256) -> bool {
        let (key, seq) = split_nonce(nonce);
        let next = self.nonces.get(&(account, key)).copied().unwrap_or_default();
        if seq != next {
            return false;
        }
        self.nonces.insert((account, key), next + 1);
        trace!(%account, %nonce, "nonce used");
        true
    }

    fn execute_call(
        &mut self,
        account: Address,
        target: Address,
        value: U256,
        data: &[u8],
    ) -> Result<Bytes, ExecutorError> {
        trace!(%account, %target, %value, len = data.len(), "execute call");
        if target == account {
            self.account_call(account, data)?;
        } else if self.managers.contains(&target) {
            self.manager_call(account, target, data)?;
        } else if self.approvals.contains_key(&target) {
            self.nft_call(account, target, data)?;
        } else if self.balances.contains_key(&target) {
            self.erc1155_call(target, data)?;
        } else {
            return Err(ExecutorError::UnknownTarget(target));
        }
        Ok(Bytes::new())
    }

    fn snapshot(&self) -> MockExecutor {
        self.clone()
    }

    /// Restores everything except nonces, which calls cannot touch.
    fn revert_to(&mut self, snapshot: MockExecutor) {
        let nonces = std::mem::take(&mut self.nonces);
        *self = snapshot;
        self.nonces = nonces;
    }

    fn current_time(&self) -> u64 {
        self.block_timestamp
    }

    fn owner_of(&self, account: Address, owner_module: Address) -> Option<Address> {
        self.owners.get(&(account, owner_module)).copied()
    }

    fn is_module_enabled(&self, account: Address, module: Address) -> bool {
        self.enabled_modules
            .get(&account)
            .is_some_and(|modules| modules.contains(&module))
    }
}
