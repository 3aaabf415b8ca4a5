//! # Record Store Handler
//!
//! Applies confirmed events to the record stores:
//!
//! | Event | Store | Change |
//! |-------|-------|--------|
//! | `ConfirmedMaker` | maker's chain | insert with status `Created` |
//! | `ConfirmedTaker` | remote chain named by the taker | status `Taken`, block number = observed height, unless `Finished` |
//! | `ConfirmedFinish` | local chain | status `Finished` |
//!
//! Unknown chains and missing records are logged and skipped; nothing here
//! stops the handler loop.

use crate::router::StoreRouter;
use shared_bus::{CrossChainEvent, Subscription};
use shared_types::{short_hex, CrossTransaction, CrossTransactionModifier};
use std::sync::Arc;
use tracing::{debug, info, warn};
use xc_02_record_store::{CrossTransactionWithSignatures, CtxStatus, StoreError};
use xc_03_call_executor::ChainInvoke;

/// What one event did to the stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleSummary {
    pub applied: usize,
    pub skipped: usize,
}

impl HandleSummary {
    fn record(&mut self, applied: bool) {
        if applied {
            self.applied += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// Consumer of confirmed events.
#[derive(Clone)]
pub struct RecordStoreHandler {
    stores: Arc<StoreRouter>,
    invoke: ChainInvoke,
}

impl RecordStoreHandler {
    pub fn new(stores: Arc<StoreRouter>, invoke: ChainInvoke) -> Self {
        Self { stores, invoke }
    }

    /// Drain `subscription` until it is closed.
    pub async fn run(self, mut subscription: Subscription) {
        info!("[xc-relay] Record store handler started");
        while let Some(event) = subscription.recv().await {
            let summary = self.handle(&event);
            debug!(
                "[xc-relay] {:?}: {} applied, {} skipped",
                event.topic(),
                summary.applied,
                summary.skipped
            );
        }
        info!("[xc-relay] Subscription closed, handler exiting");
    }

    /// Apply one event. Immediate events are ignored.
    pub fn handle(&self, event: &CrossChainEvent) -> HandleSummary {
        let mut summary = HandleSummary::default();
        match event {
            CrossChainEvent::ConfirmedMaker { txs } => {
                for tx in txs {
                    summary.record(self.store_maker(tx));
                }
            }
            CrossChainEvent::ConfirmedTaker { takers } => {
                for taker in takers {
                    summary.record(self.patch(taker, "taker", |record| {
                        if record.status != CtxStatus::Finished {
                            record.status = CtxStatus::Taken;
                            record.block_num = taker.at_block_number;
                        }
                    }));
                }
            }
            CrossChainEvent::ConfirmedFinish { finishes } => {
                for finish in finishes {
                    summary.record(self.patch(finish, "finish", |record| {
                        record.status = CtxStatus::Finished;
                    }));
                }
            }
            CrossChainEvent::NewTaker { .. }
            | CrossChainEvent::NewFinish { .. }
            | CrossChainEvent::AnchorUpdate { .. } => {}
        }
        summary
    }

    fn store_maker(&self, tx: &CrossTransaction) -> bool {
        let Some(store) = self.stores.get(&tx.chain_id) else {
            warn!(
                "[xc-relay] No store for chain {}, maker {} dropped",
                tx.chain_id,
                short_hex(&tx.id)
            );
            return false;
        };
        let position = self.invoke.locate(tx);
        if !position.is_resolved() {
            debug!(
                "[xc-relay] Block of maker {} not on chain, recorded at head {}",
                short_hex(&tx.id),
                position.number()
            );
        }
        let block_num = position.number();
        match store.write(&CrossTransactionWithSignatures::new(tx.clone(), block_num)) {
            Ok(()) => true,
            Err(e) => {
                warn!("[xc-relay] Storing maker {} failed: {}", short_hex(&tx.id), e);
                false
            }
        }
    }

    fn patch(
        &self,
        modifier: &CrossTransactionModifier,
        kind: &str,
        apply: impl FnOnce(&mut CrossTransactionWithSignatures),
    ) -> bool {
        let Some(store) = self.stores.get(&modifier.chain_id) else {
            warn!(
                "[xc-relay] No store for chain {}, {} {} dropped",
                modifier.chain_id, kind, modifier
            );
            return false;
        };
        match store.update(&modifier.id, apply) {
            Ok(_) => true,
            Err(StoreError::NotFound(_)) => {
                debug!("[xc-relay] {} {} has no record, skipped", kind, modifier);
                false
            }
            Err(e) => {
                warn!("[xc-relay] Applying {} {} failed: {}", kind, modifier, e);
                false
            }
        }
    }
}
