//! # Store Router
//!
//! One record store per chain id, opened on demand under a shared
//! `StoreContext`.

use anyhow::{Context, Result};
use parking_lot::RwLock;
use shared_types::U256;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use xc_02_record_store::{open_store, RecordStore, RepairReport, StoreContext};

/// Record stores keyed by chain id.
pub struct StoreRouter {
    ctx: StoreContext,
    stores: RwLock<HashMap<U256, Arc<RecordStore>>>,
}

impl StoreRouter {
    pub fn new(ctx: StoreContext) -> Self {
        Self {
            ctx,
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Store name used for `chain_id` under the data directory.
    pub fn store_name(chain_id: U256) -> String {
        format!("crossdb_{chain_id}")
    }

    /// Store for `chain_id`, opening it if this is the first use.
    pub fn open(&self, chain_id: U256) -> Result<Arc<RecordStore>> {
        if let Some(store) = self.get(&chain_id) {
            return Ok(store);
        }
        let mut stores = self.stores.write();
        if let Some(store) = stores.get(&chain_id) {
            return Ok(store.clone());
        }
        let name = Self::store_name(chain_id);
        let store = open_store(&self.ctx, chain_id, &name)
            .with_context(|| format!("opening record store {name} for chain {chain_id}"))?;
        let store = Arc::new(store);
        stores.insert(chain_id, store.clone());
        Ok(store)
    }

    /// Register an already opened store, replacing any for the same chain.
    pub fn insert(&self, store: RecordStore) -> Arc<RecordStore> {
        let store = Arc::new(store);
        self.stores.write().insert(store.chain_id(), store.clone());
        store
    }

    pub fn get(&self, chain_id: &U256) -> Option<Arc<RecordStore>> {
        self.stores.read().get(chain_id).cloned()
    }

    /// Chain ids with an open store, ascending.
    pub fn chain_ids(&self) -> Vec<U256> {
        let mut ids: Vec<U256> = self.stores.read().keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.stores.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.read().is_empty()
    }

    /// Run `repair` on every open store.
    pub fn repair_all(&self) -> Result<Vec<(U256, RepairReport)>> {
        let stores: Vec<(U256, Arc<RecordStore>)> = self
            .stores
            .read()
            .iter()
            .map(|(id, store)| (*id, store.clone()))
            .collect();

        let mut reports = Vec::with_capacity(stores.len());
        for (chain_id, store) in stores {
            let report = store
                .repair()
                .with_context(|| format!("repairing record store for chain {chain_id}"))?;
            reports.push((chain_id, report));
        }
        info!("[xc-relay] Repaired {} record stores", reports.len());
        Ok(reports)
    }
}
