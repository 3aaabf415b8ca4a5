//! # Reorgs Before Confirmation
//!
//! A batch whose block is replaced before it reaches the confirmation depth
//! produces no confirmed event and no record.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use shared_bus::{EventFilter, EventTopic};
    use shared_types::{BlockChain, MockChain, U256};
    use std::sync::Arc;
    use xc_relay::{Relay, RelayConfig};

    const DEPTH: u64 = 4;

    fn start() -> (Arc<MockChain>, Relay) {
        let chain = Arc::new(MockChain::new(LOCAL_CHAIN));
        let config = RelayConfig {
            contract: CONTRACT,
            confirm_depth: DEPTH,
            ..Default::default()
        };
        let relay = Relay::start(&config, chain.clone()).unwrap();
        (chain, relay)
    }

    /// Feed the canonical blocks from `from` to the head, with `logs` in the
    /// block at `from`.
    fn feed_fork(chain: &MockChain, relay: &Relay, from: u64, logs: Vec<shared_types::Log>) -> Vec<u64> {
        let mut discarded = Vec::new();
        let mut logs = Some(logs);
        for number in from..=chain.current_number() {
            let Some(header) = chain.header_at(number) else {
                continue;
            };
            let block_logs = if number == from {
                in_block(&header, logs.take().unwrap_or_default())
            } else {
                Vec::new()
            };
            let summary = relay.on_new_block(number, header.hash(), &block_logs);
            discarded.extend(summary.discarded);
        }
        discarded
    }

    #[tokio::test]
    async fn test_reorged_maker_never_stored() {
        let (chain, relay) = start();
        let local = relay.local_store().unwrap();
        let mut confirmed = relay.subscribe(EventFilter::topic(EventTopic::ConfirmedMaker));

        mine_empty(&chain, &relay, 2);
        let (orphan, _) = mine(&chain, &relay, vec![maker(1, REMOTE_CHAIN, U256::one())]);
        mine_empty(&chain, &relay, 1);

        // Blocks from 3 upward are replaced; the new fork carries no maker.
        chain.reorg(orphan.number, 1);
        assert_ne!(chain.canonical_hash(orphan.number), Some(orphan.hash()));
        chain.extend(DEPTH);
        let discarded = feed_fork(&chain, &relay, orphan.number, Vec::new());
        assert!(discarded.contains(&orphan.number));

        mine_empty(&chain, &relay, DEPTH);
        tokio::task::yield_now().await;
        assert!(!local.has(&id(1)).unwrap());
        assert!(confirmed.try_recv().unwrap().is_none());
        relay.shutdown().await;
    }

    #[tokio::test]
    async fn test_maker_reincluded_on_new_fork_stored_once() {
        let (chain, relay) = start();
        let local = relay.local_store().unwrap();

        mine_empty(&chain, &relay, 1);
        let (orphan, _) = mine(&chain, &relay, vec![maker(2, REMOTE_CHAIN, U256::one())]);

        chain.reorg(orphan.number, 7);
        let discarded = feed_fork(
            &chain,
            &relay,
            orphan.number,
            vec![maker(2, REMOTE_CHAIN, U256::one())],
        );
        assert!(discarded.contains(&orphan.number));

        mine_empty(&chain, &relay, DEPTH);
        assert!(eventually(|| local.has(&id(2)).unwrap_or(false)).await);

        let record = local.read(&id(2)).unwrap();
        assert_eq!(record.block_num, orphan.number);
        assert_ne!(record.data.block_hash, orphan.hash());
        assert_eq!(local.len().unwrap(), 1);
        relay.shutdown().await;
    }

    #[tokio::test]
    async fn test_stale_batch_found_at_promotion_is_dropped() {
        let (chain, relay) = start();
        let local = relay.local_store().unwrap();

        let (orphan, _) = mine(&chain, &relay, vec![maker(3, REMOTE_CHAIN, U256::one())]);
        // The chain forks underneath without the relay seeing the new blocks
        // at that height; promotion compares against the canonical hash.
        chain.reorg(orphan.number, 2);
        chain.extend(DEPTH);

        let head = chain.head();
        let summary = relay.on_new_block(head.number, head.hash(), &[]);
        assert_eq!(summary.discarded, vec![orphan.number]);
        assert!(summary.confirmed.is_empty());

        tokio::task::yield_now().await;
        assert!(!local.has(&id(3)).unwrap());
        relay.shutdown().await;
    }
}
