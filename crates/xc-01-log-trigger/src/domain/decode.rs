//! # Log Decoding
//!
//! Shape checks and decoding for each cross-chain contract log kind. A
//! failure here only ever drops the one log.

use shared_types::topics::{dynamic_bytes, word, word_u256};
use shared_types::{
    word_to_address, CrossTransaction, CrossTransactionModifier, DecodeError, Log, RemoteChainInfo,
    HASH_LENGTH, U256,
};

/// Indexed topics every maker/taker/finish log carries: signature, id, party.
pub const MIN_TOPICS: usize = 3;

/// Fixed payload words of a taker log.
pub const TAKER_MIN_WORDS: usize = 4;

/// Fixed payload words of a maker log (three values plus bytes offset/length).
pub const MAKER_MIN_WORDS: usize = 5;

fn require_topics(log: &Log) -> Result<(), DecodeError> {
    if log.topics.len() < MIN_TOPICS {
        return Err(DecodeError::MissingTopics {
            expected: MIN_TOPICS,
            got: log.topics.len(),
        });
    }
    Ok(())
}

fn require_words(log: &Log, words: usize) -> Result<(), DecodeError> {
    let expected = words * HASH_LENGTH;
    if log.data.len() < expected {
        return Err(DecodeError::ShortPayload {
            expected,
            got: log.data.len(),
        });
    }
    Ok(())
}

/// Decode a maker log into the cross transaction it creates on `local_chain_id`.
pub fn decode_maker(log: &Log, local_chain_id: U256) -> Result<CrossTransaction, DecodeError> {
    require_topics(log)?;
    require_words(log, MAKER_MIN_WORDS)?;

    Ok(CrossTransaction {
        id: log.topics[1],
        tx_hash: log.tx_hash,
        block_hash: log.block_hash,
        from: word_to_address(&log.topics[2]),
        value: word_u256(&log.data, 1)?,
        dest_value: word_u256(&log.data, 2)?,
        chain_id: local_chain_id,
        dest_chain_id: word_u256(&log.data, 0)?,
        data: dynamic_bytes(&log.data, 3)?,
    })
}

/// Decode a taker log. The record lives on the remote (maker) chain named
/// in the first payload word.
pub fn decode_taker(log: &Log, at: u64) -> Result<CrossTransactionModifier, DecodeError> {
    require_topics(log)?;
    require_words(log, TAKER_MIN_WORDS)?;

    Ok(CrossTransactionModifier {
        id: log.topics[1],
        chain_id: word_u256(&log.data, 0)?,
        at_block_number: at,
    })
}

/// Decode a finish log. The record lives on this chain.
pub fn decode_finish(
    log: &Log,
    local_chain_id: U256,
    at: u64,
) -> Result<CrossTransactionModifier, DecodeError> {
    require_topics(log)?;

    Ok(CrossTransactionModifier {
        id: log.topics[1],
        chain_id: local_chain_id,
        at_block_number: at,
    })
}

/// Decode an anchor add/remove log.
pub fn decode_anchor(log: &Log, at: u64) -> Result<RemoteChainInfo, DecodeError> {
    let remote = word(&log.data, 0)?;
    Ok(RemoteChainInfo {
        remote_chain_id: U256::from_big_endian(&remote),
        block_number: at,
    })
}
