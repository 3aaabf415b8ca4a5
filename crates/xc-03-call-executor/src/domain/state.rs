//! # Copy-on-Write State
//!
//! `StateDb` is a stack of frozen, shared layers under one private dirty
//! layer. Reads walk from the dirty layer down; writes only touch the dirty
//! layer. `copy()` shares every frozen layer and clones only the dirty one,
//! so a clone per call costs O(dirty), and `freeze()` makes the next copies
//! O(1).

use shared_types::{Address, Hash, U256};
use std::collections::HashMap;
use std::sync::Arc;

/// Account as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub balance: U256,
    pub nonce: u64,
    pub code: Arc<[u8]>,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            balance: U256::zero(),
            nonce: 0,
            code: Arc::from(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Layer {
    accounts: HashMap<Address, Account>,
    storage: HashMap<(Address, Hash), U256>,
}

impl Layer {
    fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.storage.is_empty()
    }
}

#[derive(Debug)]
struct Frozen {
    layer: Layer,
    parent: Option<Arc<Frozen>>,
}

/// Layered account and storage state.
#[derive(Debug, Default)]
pub struct StateDb {
    frozen: Option<Arc<Frozen>>,
    dirty: Layer,
}

impl StateDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Independent clone sharing every frozen layer.
    #[must_use]
    pub fn copy(&self) -> Self {
        Self {
            frozen: self.frozen.clone(),
            dirty: self.dirty.clone(),
        }
    }

    /// Seal the dirty layer so later copies share it.
    pub fn freeze(&mut self) {
        if self.dirty.is_empty() {
            return;
        }
        let layer = std::mem::take(&mut self.dirty);
        self.frozen = Some(Arc::new(Frozen {
            layer,
            parent: self.frozen.take(),
        }));
    }

    /// Number of frozen layers below the dirty one.
    pub fn depth(&self) -> usize {
        std::iter::successors(self.frozen.as_deref(), |f| f.parent.as_deref()).count()
    }

    /// Entries written since the last `freeze`.
    pub fn dirty_len(&self) -> usize {
        self.dirty.accounts.len() + self.dirty.storage.len()
    }

    fn layers(&self) -> impl Iterator<Item = &Layer> {
        std::iter::once(&self.dirty).chain(
            std::iter::successors(self.frozen.as_deref(), |f| f.parent.as_deref())
                .map(|f| &f.layer),
        )
    }

    // =========================================================================
    // ACCOUNTS
    // =========================================================================

    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.layers().find_map(|layer| layer.accounts.get(address))
    }

    pub fn exists(&self, address: &Address) -> bool {
        self.account(address).is_some()
    }

    fn account_mut(&mut self, address: &Address) -> &mut Account {
        if !self.dirty.accounts.contains_key(address) {
            let current = self.account(address).cloned().unwrap_or_default();
            self.dirty.accounts.insert(*address, current);
        }
        self.dirty.accounts.entry(*address).or_default()
    }

    pub fn balance(&self, address: &Address) -> U256 {
        self.account(address).map_or_else(U256::zero, |a| a.balance)
    }

    pub fn set_balance(&mut self, address: &Address, balance: U256) {
        self.account_mut(address).balance = balance;
    }

    /// Add to a balance, saturating at `U256::MAX`.
    pub fn add_balance(&mut self, address: &Address, amount: U256) {
        let account = self.account_mut(address);
        account.balance = account.balance.saturating_add(amount);
    }

    /// Subtract from a balance. Returns false, changing nothing, when the
    /// balance is too low.
    pub fn sub_balance(&mut self, address: &Address, amount: U256) -> bool {
        if self.balance(address) < amount {
            return false;
        }
        let account = self.account_mut(address);
        account.balance -= amount;
        true
    }

    pub fn nonce(&self, address: &Address) -> u64 {
        self.account(address).map_or(0, |a| a.nonce)
    }

    pub fn set_nonce(&mut self, address: &Address, nonce: u64) {
        self.account_mut(address).nonce = nonce;
    }

    pub fn code(&self, address: &Address) -> Arc<[u8]> {
        self.account(address)
            .map_or_else(|| Arc::from(Vec::new()), |a| a.code.clone())
    }

    pub fn set_code(&mut self, address: &Address, code: impl Into<Arc<[u8]>>) {
        self.account_mut(address).code = code.into();
    }

    // =========================================================================
    // STORAGE
    // =========================================================================

    /// Storage slot value; zero if never written.
    pub fn storage(&self, address: &Address, slot: &Hash) -> U256 {
        let key = (*address, *slot);
        self.layers()
            .find_map(|layer| layer.storage.get(&key).copied())
            .unwrap_or_default()
    }

    pub fn set_storage(&mut self, address: &Address, slot: Hash, value: U256) {
        self.dirty.storage.insert((*address, slot), value);
    }
}
