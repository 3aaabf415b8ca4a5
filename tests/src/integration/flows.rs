//! # Relay Flows
//!
//! Maker, taker and finish logs travelling from blocks through the trigger's
//! confirmation buffer into the record stores.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use shared_bus::{CrossChainEvent, EventFilter, EventTopic};
    use shared_types::{MockChain, U256};
    use std::sync::Arc;
    use xc_02_record_store::{CrossTransactionWithSignatures, CtxStatus, FieldName, Filter};
    use xc_relay::{Relay, RelayConfig};

    const DEPTH: u64 = 3;

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
    async fn test_maker_then_finish_on_local_chain() {
        let (chain, relay) = start();
        let local = relay.local_store().unwrap();

        let (maker_block, summary) = mine(&chain, &relay, vec![maker(1, REMOTE_CHAIN, U256::exp10(18))]);
        assert_eq!(summary.queued, 1);

        // Not yet buried deep enough
        mine_empty(&chain, &relay, DEPTH - 1);
        tokio::task::yield_now().await;
        assert!(!local.has(&id(1)).unwrap());

        let promoted = mine_empty(&chain, &relay, 1);
        assert_eq!(promoted[0].confirmed, vec![maker_block.number]);
        assert!(eventually(|| local.has(&id(1)).unwrap_or(false)).await);

        let record = local.read(&id(1)).unwrap();
        assert_eq!(record.status, CtxStatus::Created);
        assert_eq!(record.block_num, maker_block.number);
        assert_eq!(record.dest_chain_id(), U256::from(REMOTE_CHAIN));
        assert_eq!(record.value(), U256::exp10(18));

        mine(&chain, &relay, vec![finish(1)]);
        mine_empty(&chain, &relay, DEPTH);
        assert!(
            eventually(|| local
                .read(&id(1))
                .map(|r| r.status == CtxStatus::Finished)
                .unwrap_or(false))
            .await
        );

        let finished = local
            .count(&[Filter::eq(FieldName::Status, CtxStatus::Finished)])
            .unwrap();
        assert_eq!(finished, 1);
        relay.shutdown().await;
    }

    #[tokio::test]
    async fn test_taker_updates_remote_store() {
        let (chain, relay) = start();
        let remote = relay.open_remote(U256::from(REMOTE_CHAIN)).unwrap();
        remote
            .write(&CrossTransactionWithSignatures::new(
                shared_types::CrossTransaction {
                    id: id(9),
                    chain_id: U256::from(REMOTE_CHAIN),
                    dest_chain_id: U256::from(LOCAL_CHAIN),
                    ..Default::default()
                },
                40,
            ))
            .unwrap();

        let mut sightings = relay.subscribe(EventFilter::topic(EventTopic::NewTaker));
        let (taker_block, summary) = mine(&chain, &relay, vec![taker(9, REMOTE_CHAIN)]);
        assert_eq!(summary.takers, 1);

        match sightings.recv().await {
            Some(CrossChainEvent::NewTaker { takers }) => {
                assert_eq!(takers.len(), 1);
                assert_eq!(takers[0].id, id(9));
                assert_eq!(takers[0].chain_id, U256::from(REMOTE_CHAIN));
            }
            other => panic!("expected NewTaker, got {other:?}"),
        }

        mine_empty(&chain, &relay, DEPTH);
        assert!(
            eventually(|| remote
                .read(&id(9))
                .map(|r| r.status == CtxStatus::Taken)
                .unwrap_or(false))
            .await
        );
        assert_eq!(remote.read(&id(9)).unwrap().block_num, taker_block.number);
        relay.shutdown().await;
    }

    #[tokio::test]
    async fn test_bad_logs_do_not_block_siblings() {
        let (chain, relay) = start();
        let local = relay.local_store().unwrap();

        let mut short_taker = taker(3, REMOTE_CHAIN);
        short_taker.data.truncate(100);
        let mut broken_maker = maker(4, REMOTE_CHAIN, U256::one());
        broken_maker.topics.truncate(2);
        let mut foreign = maker(5, REMOTE_CHAIN, U256::one());
        foreign.address = [0xAB; 20];

        let (_, summary) = mine(
            &chain,
            &relay,
            vec![short_taker, broken_maker, foreign, maker(6, REMOTE_CHAIN, U256::one())],
        );
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.takers, 0);
        // Makers are only decoded at confirmation
        assert_eq!(summary.queued, 2);

        mine_empty(&chain, &relay, DEPTH);
        assert!(eventually(|| local.has(&id(6)).unwrap_or(false)).await);
        assert!(!local.has(&id(4)).unwrap());
        assert!(!local.has(&id(5)).unwrap());
        relay.shutdown().await;
    }

    #[tokio::test]
    async fn test_many_makers_paged_by_height() {
        let (chain, relay) = start();
        let local = relay.local_store().unwrap();

        for n in 1..=6u8 {
            mine(&chain, &relay, vec![maker(n, REMOTE_CHAIN, U256::from(n))]);
        }
        mine_empty(&chain, &relay, DEPTH);
        assert!(eventually(|| local.len().unwrap_or(0) == 6).await);

        let page = local.query(2, 2, FieldName::BlockNum, &[]).unwrap();
        assert_eq!(page.iter().map(|r| r.id()).collect::<Vec<_>>(), vec![id(3), id(4)]);
        assert_eq!(local.range_by_number(2, 4, 0).unwrap().len(), 3);
        assert_eq!(local.height().unwrap(), 6);
        relay.shutdown().await;
    }

    #[cfg(feature = "rocksdb")]
    #[tokio::test]
    async fn test_durable_store_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let chain = Arc::new(MockChain::new(LOCAL_CHAIN));
        let config = RelayConfig {
            contract: CONTRACT,
            confirm_depth: DEPTH,
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };

        {
            let relay = Relay::start(&config, chain.clone()).unwrap();
            let local = relay.local_store().unwrap();
            mine(&chain, &relay, vec![maker(1, REMOTE_CHAIN, U256::one())]);
            mine_empty(&chain, &relay, DEPTH);
            assert!(eventually(|| local.has(&id(1)).unwrap_or(false)).await);
            relay.shutdown().await;
        }

        let relay = Relay::start(&config, chain.clone()).unwrap();
        let local = relay.local_store().unwrap();
        assert_eq!(local.read(&id(1)).unwrap().block_num, 1);
        assert_eq!(local.height().unwrap(), 1);
        relay.shutdown().await;
    }
}
