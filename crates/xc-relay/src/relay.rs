//! # Relay
//!
//! Owns one chain's relay pipeline: the log trigger, the record stores and
//! the task that applies confirmed events.
//!
//! ## Startup Sequence
//!
//! 1. Sanitise and validate the configuration
//! 2. Settle the local chain id against the chain
//! 3. Open (and re-index) the local record store
//! 4. Subscribe the handler to confirmed events and spawn it
//!
//! Must be started inside a tokio runtime.

use crate::config::RelayConfig;
use crate::handler::RecordStoreHandler;
use crate::router::StoreRouter;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, Subscription};
use shared_types::{BlockChain, BlockHeader, Hash, Log, U256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use xc_01_log_trigger::{ClassifySummary, CrossTrigger};
use xc_02_record_store::{RecordStore, StoreContext};
use xc_03_call_executor::{CallExecutor, ChainInvoke, ExecutionEngine, StateDb};

pub struct Relay {
    config: RelayConfig,
    chain_id: U256,
    bus: Arc<InMemoryEventBus>,
    trigger: CrossTrigger,
    stores: Arc<StoreRouter>,
    invoke: ChainInvoke,
    handler: Mutex<Option<JoinHandle<()>>>,
    stopped: AtomicBool,
}

impl Relay {
    /// Build and start the relay for `chain`.
    pub fn start(config: &RelayConfig, chain: Arc<dyn BlockChain>) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current()
            .context("relay must be started inside a tokio runtime")?;

        let config = config.sanitize();
        config.validate().context("invalid relay configuration")?;
        let chain_id = config
            .resolve_chain_id(chain.chain_id())
            .context("invalid relay configuration")?;

        let bus = Arc::new(InMemoryEventBus::new());
        let trigger = CrossTrigger::new(config.contract, chain.clone(), bus.clone())
            .with_depth(config.confirm_depth);

        let stores = Arc::new(StoreRouter::new(StoreContext {
            data_dir: config.data_dir.clone(),
            cache_size: config.store_cache_size,
            ..StoreContext::in_memory()
        }));
        stores.open(chain_id)?;

        let invoke = ChainInvoke::new(chain);
        let handler = RecordStoreHandler::new(stores.clone(), invoke.clone());
        let confirmed = trigger.subscribe(EventFilter::topics(EventTopic::CONFIRMED.to_vec()));
        let task = runtime.spawn(handler.run(confirmed));

        info!(
            "[xc-relay] Relay started for chain {} (contract {}, depth {})",
            chain_id,
            shared_types::short_hex(&config.contract),
            config.confirm_depth
        );

        Ok(Self {
            config,
            chain_id,
            bus,
            trigger,
            stores,
            invoke,
            handler: Mutex::new(Some(task)),
            stopped: AtomicBool::new(false),
        })
    }

    /// Feed one new head block. After `stop` this is a no-op.
    pub fn on_new_block(&self, height: u64, hash: Hash, logs: &[Log]) -> ClassifySummary {
        if self.is_stopped() {
            debug!("[xc-relay] Stopped, ignoring block {}", height);
            return ClassifySummary::default();
        }
        self.trigger.classify(height, hash, logs)
    }

    /// Subscribe to relay events; closed when the relay stops.
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.trigger.subscribe(filter)
    }

    /// Open (or fetch) the store of a remote chain.
    pub fn open_remote(&self, chain_id: U256) -> Result<Arc<RecordStore>> {
        self.stores.open(chain_id)
    }

    /// Executor for verification calls against `state` pinned at `header`,
    /// bounded by the configured call timeout.
    pub fn call_executor(
        &self,
        engine: Arc<dyn ExecutionEngine>,
        header: BlockHeader,
        state: StateDb,
    ) -> CallExecutor {
        CallExecutor::new(engine, header, state).with_timeout(self.config.call_timeout)
    }

    /// The local chain's store.
    pub fn local_store(&self) -> Option<Arc<RecordStore>> {
        self.stores.get(&self.chain_id)
    }

    /// Close every subscription. The handler drains what was already
    /// delivered and exits. Safe to call more than once.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.trigger.stop();
        info!("[xc-relay] Relay for chain {} stopped", self.chain_id);
    }

    /// Stop, then wait for the handler task to finish.
    pub async fn shutdown(&self) {
        self.stop();
        let task = self.handler.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("[xc-relay] Handler task ended abnormally: {}", e);
            }
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn chain_id(&self) -> U256 {
        self.chain_id
    }

    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    pub fn trigger(&self) -> &CrossTrigger {
        &self.trigger
    }

    pub fn stores(&self) -> &Arc<StoreRouter> {
        &self.stores
    }

    pub fn invoke(&self) -> &ChainInvoke {
        &self.invoke
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        self.stop();
    }
}
