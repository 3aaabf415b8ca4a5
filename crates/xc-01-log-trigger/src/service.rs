//! # Cross Trigger Service
//!
//! Entry point for new blocks. Classifies the cross-chain contract's logs,
//! publishes immediate events, queues logs for confirmation, and publishes
//! confirmed events for batches the buffer promotes.

use crate::domain::{
    decode_anchor, decode_finish, decode_maker, decode_taker, ShiftOutcome, UnconfirmedBlockLogs,
    DEFAULT_CONFIRM_DEPTH,
};
use parking_lot::Mutex;
use shared_bus::{
    CrossChainEvent, EventFilter, EventPublisher, EventTopic, InMemoryEventBus, Subscription,
    SubscriptionScope,
};
use shared_types::{short_hex, Address, BlockChain, Hash, Log, TopicKind};
use std::sync::Arc;
use tracing::{debug, info};

/// What one `classify` call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifySummary {
    /// Logs queued for confirmation.
    pub queued: usize,
    /// Takers published immediately.
    pub takers: usize,
    /// Finishes published immediately.
    pub finishes: usize,
    /// Anchor changes published.
    pub anchors: usize,
    /// Logs of the contract dropped for a bad shape.
    pub skipped: usize,
    /// Heights promoted during this call.
    pub confirmed: Vec<u64>,
    /// Heights dropped as reorged or replaced by a sibling during this call.
    pub discarded: Vec<u64>,
}

/// Watches one contract's logs and turns them into cross-chain events.
pub struct CrossTrigger {
    contract: Address,
    chain: Arc<dyn BlockChain>,
    bus: Arc<InMemoryEventBus>,
    unconfirmed: Mutex<UnconfirmedBlockLogs>,
    scope: SubscriptionScope,
}

impl CrossTrigger {
    /// Create a trigger with the default confirmation depth.
    pub fn new(contract: Address, chain: Arc<dyn BlockChain>, bus: Arc<InMemoryEventBus>) -> Self {
        Self {
            contract,
            chain,
            bus,
            unconfirmed: Mutex::new(UnconfirmedBlockLogs::new(DEFAULT_CONFIRM_DEPTH)),
            scope: SubscriptionScope::new(),
        }
    }

    /// Override the confirmation depth.
    #[must_use]
    pub fn with_depth(mut self, depth: u64) -> Self {
        self.unconfirmed = Mutex::new(UnconfirmedBlockLogs::new(depth));
        self
    }

    #[must_use]
    pub fn contract(&self) -> Address {
        self.contract
    }

    #[must_use]
    pub fn depth(&self) -> u64 {
        self.unconfirmed.lock().depth()
    }

    /// Batches still waiting for confirmation.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.unconfirmed.lock().len()
    }

    /// Process the logs of a new block at (`height`, `hash`).
    ///
    /// Never fails: a log with the wrong shape is skipped on its own.
    pub fn classify(&self, height: u64, hash: Hash, logs: &[Log]) -> ClassifySummary {
        let local_chain = self.chain.chain_id();
        let mut summary = ClassifySummary::default();
        let mut queued = Vec::new();
        let mut takers = Vec::new();
        let mut finishes = Vec::new();
        let mut anchors = Vec::new();

        for log in logs.iter().filter(|l| l.address == self.contract) {
            let Some(kind) = log.signature().and_then(TopicKind::classify) else {
                continue;
            };

            let decoded = match kind {
                TopicKind::Maker => Ok(()),
                TopicKind::Taker => decode_taker(log, height).map(|m| takers.push(m)),
                TopicKind::MakerFinish => {
                    decode_finish(log, local_chain, height).map(|m| finishes.push(m))
                }
                TopicKind::AddAnchors | TopicKind::RemoveAnchors => {
                    decode_anchor(log, height).map(|info| anchors.push(info))
                }
            };

            match decoded {
                Ok(()) if kind.needs_confirmation() => queued.push(log.clone()),
                Ok(()) => {}
                Err(e) => {
                    summary.skipped += 1;
                    debug!(
                        "[xc-01] Skipping malformed {:?} log at height {} (tx {}): {}",
                        kind,
                        height,
                        short_hex(&log.tx_hash),
                        e
                    );
                }
            }
        }

        summary.queued = queued.len();
        summary.takers = takers.len();
        summary.finishes = finishes.len();
        summary.anchors = anchors.len();

        // Immediate events go out before the batch is buffered so a
        // subscriber never sees a confirmation ahead of its sighting.
        if !takers.is_empty() {
            self.bus.publish(CrossChainEvent::NewTaker { takers });
        }
        if !anchors.is_empty() {
            self.bus.publish(CrossChainEvent::AnchorUpdate { chain_info: anchors });
        }
        if !finishes.is_empty() {
            self.bus.publish(CrossChainEvent::NewFinish { finishes });
        }

        let outcomes = self
            .unconfirmed
            .lock()
            .insert(self.chain.as_ref(), height, hash, queued);

        for outcome in outcomes {
            match outcome {
                ShiftOutcome::Confirmed(batch) => {
                    summary.confirmed.push(batch.height);
                    self.publish_confirmed(batch.height, &batch.logs);
                }
                ShiftOutcome::Discarded { height, .. } => summary.discarded.push(height),
            }
        }

        summary
    }

    /// Regroup a promoted batch by kind and publish one event per kind.
    fn publish_confirmed(&self, height: u64, logs: &[Log]) {
        let local_chain = self.chain.chain_id();
        let mut txs = Vec::new();
        let mut takers = Vec::new();
        let mut finishes = Vec::new();

        for log in logs {
            let Some(kind) = log.signature().and_then(TopicKind::classify) else {
                continue;
            };
            let decoded = match kind {
                TopicKind::Maker => decode_maker(log, local_chain).map(|tx| txs.push(tx)),
                TopicKind::Taker => decode_taker(log, height).map(|m| takers.push(m)),
                TopicKind::MakerFinish => {
                    decode_finish(log, local_chain, height).map(|m| finishes.push(m))
                }
                TopicKind::AddAnchors | TopicKind::RemoveAnchors => Ok(()),
            };
            if let Err(e) = decoded {
                debug!(
                    "[xc-01] Skipping malformed confirmed {:?} log at height {}: {}",
                    kind, height, e
                );
            }
        }

        if !txs.is_empty() || !takers.is_empty() || !finishes.is_empty() {
            info!(
                "[xc-01] Height {} confirmed: {} makers, {} takers, {} finishes",
                height,
                txs.len(),
                takers.len(),
                finishes.len()
            );
        }

        if !txs.is_empty() {
            self.bus.publish(CrossChainEvent::ConfirmedMaker { txs });
        }
        if !takers.is_empty() {
            self.bus.publish(CrossChainEvent::ConfirmedTaker { takers });
        }
        if !finishes.is_empty() {
            self.bus.publish(CrossChainEvent::ConfirmedFinish { finishes });
        }
    }

    /// Subscribe to any set of trigger topics. Revoked by `stop`.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.scope.track(self.bus.subscribe(filter))
    }

    #[must_use]
    pub fn subscribe_new_taker(&self) -> Subscription {
        self.subscribe(EventFilter::topic(EventTopic::NewTaker))
    }

    #[must_use]
    pub fn subscribe_new_finish(&self) -> Subscription {
        self.subscribe(EventFilter::topic(EventTopic::NewFinish))
    }

    #[must_use]
    pub fn subscribe_anchor_update(&self) -> Subscription {
        self.subscribe(EventFilter::topic(EventTopic::AnchorUpdate))
    }

    #[must_use]
    pub fn subscribe_confirmed_maker(&self) -> Subscription {
        self.subscribe(EventFilter::topic(EventTopic::ConfirmedMaker))
    }

    #[must_use]
    pub fn subscribe_confirmed_taker(&self) -> Subscription {
        self.subscribe(EventFilter::topic(EventTopic::ConfirmedTaker))
    }

    #[must_use]
    pub fn subscribe_confirmed_finish(&self) -> Subscription {
        self.subscribe(EventFilter::topic(EventTopic::ConfirmedFinish))
    }

    /// Close every subscription handed out. Safe to call more than once.
    pub fn stop(&self) {
        let revoked = self.scope.close();
        if revoked > 0 {
            info!("[xc-01] Trigger stopped, {} subscriptions closed", revoked);
        }
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.scope.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::decode::fixtures::*;
    use shared_types::{BlockHeader, MockChain, U256};
    use std::time::Duration;
    use tokio::time::timeout;

    const LOCAL_CHAIN: u64 = 1;
    const REMOTE_CHAIN: u64 = 2;

    fn setup(depth: u64) -> (Arc<MockChain>, CrossTrigger) {
        let chain = Arc::new(MockChain::new(LOCAL_CHAIN));
        let trigger = CrossTrigger::new(CONTRACT, chain.clone(), Arc::new(InMemoryEventBus::new()))
            .with_depth(depth);
        (chain, trigger)
    }

    /// Mine one block carrying `logs` and hand it to the trigger.
    fn mine(chain: &MockChain, trigger: &CrossTrigger, logs: &[Log]) -> (BlockHeader, ClassifySummary) {
        let header = chain.extend(1).remove(0);
        let summary = trigger.classify(header.number, header.hash(), logs);
        (header, summary)
    }

    fn mine_empty(chain: &MockChain, trigger: &CrossTrigger, n: u64) -> Vec<ClassifySummary> {
        (0..n).map(|_| mine(chain, trigger, &[]).1).collect()
    }

    async fn next(sub: &mut Subscription) -> CrossChainEvent {
        timeout(Duration::from_secs(1), sub.recv())
            .await
            .expect("timeout")
            .expect("event")
    }

    #[tokio::test]
    async fn test_maker_only_confirmed() {
        let (chain, trigger) = setup(3);
        let mut immediate = trigger.subscribe(EventFilter::topics(vec![
            EventTopic::NewTaker,
            EventTopic::NewFinish,
        ]));
        let mut confirmed = trigger.subscribe_confirmed_maker();

        let (_, summary) = mine(&chain, &trigger, &[maker(1, REMOTE_CHAIN, 10, b"x")]);
        assert_eq!(summary.queued, 1);
        assert_eq!(summary.takers, 0);

        let summaries = mine_empty(&chain, &trigger, 3);
        assert_eq!(summaries[2].confirmed, vec![1]);

        match next(&mut confirmed).await {
            CrossChainEvent::ConfirmedMaker { txs } => {
                assert_eq!(txs.len(), 1);
                assert_eq!(txs[0].id, id(1));
                assert_eq!(txs[0].chain_id, U256::from(LOCAL_CHAIN));
                assert_eq!(txs[0].dest_chain_id, U256::from(REMOTE_CHAIN));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(immediate.try_recv(), Ok(None)));
    }

    #[tokio::test]
    async fn test_taker_immediate_before_confirmed() {
        let (chain, trigger) = setup(0);
        let mut sub = trigger.subscribe(EventFilter::topics(vec![
            EventTopic::NewTaker,
            EventTopic::ConfirmedTaker,
        ]));

        // Depth 0: confirmation happens in the same call
        let (_, summary) = mine(&chain, &trigger, &[taker(5, REMOTE_CHAIN)]);
        assert_eq!(summary.takers, 1);
        assert_eq!(summary.confirmed, vec![1]);

        let first = next(&mut sub).await;
        let second = next(&mut sub).await;
        assert_eq!(first.topic(), EventTopic::NewTaker);
        assert_eq!(second.topic(), EventTopic::ConfirmedTaker);
        match second {
            CrossChainEvent::ConfirmedTaker { takers } => {
                assert_eq!(takers[0].id, id(5));
                assert_eq!(takers[0].chain_id, U256::from(REMOTE_CHAIN));
                assert_eq!(takers[0].at_block_number, 1);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_taker_skipped_alone() {
        let (chain, trigger) = setup(12);
        let mut takers = trigger.subscribe_new_taker();

        let mut short = taker(1, REMOTE_CHAIN);
        short.data.truncate(96);
        let mut bare = taker(2, REMOTE_CHAIN);
        bare.topics.truncate(2);
        let good = taker(3, REMOTE_CHAIN);

        let (_, summary) = mine(&chain, &trigger, &[short, bare, good]);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.takers, 1);
        assert_eq!(summary.queued, 1);

        match next(&mut takers).await {
            CrossChainEvent::NewTaker { takers } => {
                assert_eq!(takers.len(), 1);
                assert_eq!(takers[0].id, id(3));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_finish_uses_local_chain_and_anchor_not_queued() {
        let (chain, trigger) = setup(12);
        let mut finishes = trigger.subscribe_new_finish();
        let mut anchors = trigger.subscribe_anchor_update();

        let (_, summary) = mine(
            &chain,
            &trigger,
            &[finish(9), anchor(TopicKind::AddAnchors, REMOTE_CHAIN)],
        );
        assert_eq!(summary.queued, 1);
        assert_eq!(summary.anchors, 1);

        match next(&mut finishes).await {
            CrossChainEvent::NewFinish { finishes } => {
                assert_eq!(finishes[0].chain_id, U256::from(LOCAL_CHAIN));
            }
            other => panic!("unexpected event {other:?}"),
        }
        match next(&mut anchors).await {
            CrossChainEvent::AnchorUpdate { chain_info } => {
                assert_eq!(chain_info[0].remote_chain_id, U256::from(REMOTE_CHAIN));
                assert_eq!(chain_info[0].block_number, 1);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_foreign_contract_and_unknown_topics_ignored() {
        let (chain, trigger) = setup(12);

        let mut foreign = taker(1, REMOTE_CHAIN);
        foreign.address = [0x01; 20];
        let unknown = Log {
            address: CONTRACT,
            topics: vec![[0x42; 32]],
            ..Default::default()
        };
        let no_topics = Log {
            address: CONTRACT,
            ..Default::default()
        };

        let (_, summary) = mine(&chain, &trigger, &[foreign, unknown, no_topics]);
        assert_eq!(summary, ClassifySummary::default());
        assert_eq!(trigger.pending(), 0);
    }

    #[tokio::test]
    async fn test_reorged_batch_emits_nothing() {
        let (chain, trigger) = setup(2);
        let mut confirmed = trigger.subscribe(EventFilter::topics(EventTopic::CONFIRMED.to_vec()));

        mine(&chain, &trigger, &[maker(1, REMOTE_CHAIN, 10, b""), taker(2, REMOTE_CHAIN)]);
        // Block 1 is replaced before it is deep enough
        chain.reorg(1, 0xB0);
        let summaries = mine_empty(&chain, &trigger, 2);

        let discarded: Vec<u64> = summaries.iter().flat_map(|s| s.discarded.clone()).collect();
        assert_eq!(discarded, vec![1]);
        assert!(summaries.iter().all(|s| s.confirmed.is_empty()));

        let nothing = timeout(Duration::from_millis(100), confirmed.recv()).await;
        assert!(nothing.is_err());
    }

    #[tokio::test]
    async fn test_malformed_maker_dropped_at_confirmation() {
        let (chain, trigger) = setup(1);
        let mut confirmed = trigger.subscribe_confirmed_maker();

        let mut broken = maker(1, REMOTE_CHAIN, 10, b"abc");
        broken.data.truncate(64);
        mine(&chain, &trigger, &[broken, maker(2, REMOTE_CHAIN, 10, b"ok")]);
        mine_empty(&chain, &trigger, 1);

        match next(&mut confirmed).await {
            CrossChainEvent::ConfirmedMaker { txs } => {
                assert_eq!(txs.len(), 1);
                assert_eq!(txs[0].id, id(2));
                assert_eq!(txs[0].data, b"ok".to_vec());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stop_closes_subscriptions() {
        let (chain, trigger) = setup(12);
        let mut sub = trigger.subscribe_new_taker();

        trigger.stop();
        trigger.stop();
        assert!(trigger.is_stopped());

        mine(&chain, &trigger, &[taker(1, REMOTE_CHAIN)]);
        let end = timeout(Duration::from_secs(1), sub.recv()).await;
        assert_eq!(end, Ok(None));

        // Subscriptions taken after stop are closed from the start
        let mut late = trigger.subscribe_confirmed_maker();
        assert!(late.try_recv().is_err());
    }
}
