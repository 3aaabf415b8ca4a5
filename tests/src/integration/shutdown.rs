//! # Shutdown and Delivery Order
//!
//! Stopping the relay revokes every subscription at once; per subscriber,
//! a log's immediate event is never delivered after its confirmed event.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use shared_bus::{CrossChainEvent, EventFilter, EventTopic};
    use shared_types::MockChain;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;
    use xc_relay::{Relay, RelayConfig};

    const DEPTH: u64 = 2;

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

    #[tokio::test]
    async fn test_immediate_before_confirmed_when_catching_up() {
        let (chain, relay) = start();
        let mut sub = relay.subscribe(EventFilter::topics(vec![
            EventTopic::NewTaker,
            EventTopic::ConfirmedTaker,
        ]));

        // The chain is already past the confirmation depth when the block
        // arrives, so both events come out of one call.
        let header = chain.extend(1).remove(0);
        chain.extend(DEPTH + 3);
        let logs = in_block(&header, vec![taker(1, REMOTE_CHAIN)]);
        let summary = relay.on_new_block(header.number, header.hash(), &logs);
        assert_eq!(summary.takers, 1);
        assert_eq!(summary.confirmed, vec![header.number]);

        let first = timeout(Duration::from_secs(2), sub.recv()).await.unwrap();
        let second = timeout(Duration::from_secs(2), sub.recv()).await.unwrap();
        assert!(matches!(first, Some(CrossChainEvent::NewTaker { .. })));
        assert!(matches!(second, Some(CrossChainEvent::ConfirmedTaker { .. })));
        relay.shutdown().await;
    }

    #[tokio::test]
    async fn test_stop_closes_every_subscription() {
        let (_chain, relay) = start();
        let mut a = relay.subscribe(EventFilter::all());
        let mut b = relay.subscribe(EventFilter::topic(EventTopic::AnchorUpdate));

        relay.stop();
        assert_eq!(timeout(Duration::from_secs(2), a.recv()).await.unwrap(), None);
        assert_eq!(timeout(Duration::from_secs(2), b.recv()).await.unwrap(), None);

        // Subscribing after stop hands back a closed subscription
        let mut late = relay.subscribe(EventFilter::all());
        assert_eq!(timeout(Duration::from_secs(2), late.recv()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_blocks_after_stop_are_ignored() {
        let (chain, relay) = start();
        let local = relay.local_store().unwrap();

        mine(&chain, &relay, vec![maker(1, REMOTE_CHAIN, 1u64.into())]);
        relay.stop();
        relay.stop();

        let summaries = mine_empty(&chain, &relay, DEPTH + 1);
        assert!(summaries.iter().all(|s| s.confirmed.is_empty()));
        tokio::task::yield_now().await;
        assert!(!local.has(&id(1)).unwrap());
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_handler() {
        let (chain, relay) = start();
        mine(&chain, &relay, vec![maker(1, REMOTE_CHAIN, 1u64.into())]);
        mine_empty(&chain, &relay, DEPTH);

        timeout(Duration::from_secs(2), relay.shutdown()).await.unwrap();
        assert!(relay.is_stopped());
        assert_eq!(relay.bus().subscriber_count(), 0);
        // Second shutdown has nothing left to wait for
        timeout(Duration::from_secs(2), relay.shutdown()).await.unwrap();
    }
}
