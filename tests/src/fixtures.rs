//! Contract log builders and helpers for driving a relay over a `MockChain`.

use shared_types::{
    address_to_word, u256_to_word, Address, BlockHeader, Hash, Log, MockChain, TopicKind, U256,
};
use std::time::Duration;
use xc_01_log_trigger::ClassifySummary;
use xc_relay::Relay;

pub const CONTRACT: Address = [0xCC; 20];
pub const LOCAL_CHAIN: u64 = 1;
pub const REMOTE_CHAIN: u64 = 2;

pub fn id(n: u8) -> Hash {
    [n; 32]
}

fn words(values: &[U256]) -> Vec<u8> {
    values.iter().flat_map(u256_to_word).collect()
}

/// Maker on this chain, destined for `remote_chain`.
pub fn maker(n: u8, remote_chain: u64, value: U256) -> Log {
    let payload = b"cross";
    let mut data = words(&[
        U256::from(remote_chain),
        value,
        value / 2,
        U256::from(128u64),
        U256::from(payload.len()),
    ]);
    data.extend_from_slice(payload);
    Log {
        address: CONTRACT,
        topics: vec![TopicKind::Maker.topic(), id(n), address_to_word(&[n; 20])],
        data,
        ..Default::default()
    }
}

/// Taker on this chain of a maker made on `remote_chain`.
pub fn taker(n: u8, remote_chain: u64) -> Log {
    Log {
        address: CONTRACT,
        topics: vec![TopicKind::Taker.topic(), id(n), [0xEE; 32]],
        data: words(&[
            U256::from(remote_chain),
            U256::from(1u64),
            U256::from(100u64),
            U256::from(50u64),
        ]),
        ..Default::default()
    }
}

/// Finish of a maker made on this chain.
pub fn finish(n: u8) -> Log {
    Log {
        address: CONTRACT,
        topics: vec![TopicKind::MakerFinish.topic(), id(n), [0xEE; 32]],
        ..Default::default()
    }
}

/// Stamp logs with the block that contains them.
pub fn in_block(header: &BlockHeader, logs: Vec<Log>) -> Vec<Log> {
    logs.into_iter()
        .enumerate()
        .map(|(i, log)| Log {
            block_number: header.number,
            block_hash: header.hash(),
            tx_hash: [i as u8 + 1; 32],
            index: i as u32,
            ..log
        })
        .collect()
}

/// Grow the chain by one block carrying `logs` and feed it to the relay.
pub fn mine(chain: &MockChain, relay: &Relay, logs: Vec<Log>) -> (BlockHeader, ClassifySummary) {
    let header = chain.extend(1).remove(0);
    let logs = in_block(&header, logs);
    let summary = relay.on_new_block(header.number, header.hash(), &logs);
    (header, summary)
}

/// Grow the chain by `count` empty blocks, feeding each.
pub fn mine_empty(chain: &MockChain, relay: &Relay, count: u64) -> Vec<ClassifySummary> {
    (0..count).map(|_| mine(chain, relay, Vec::new()).1).collect()
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
