//! # Cross-Chain Contract Topics
//!
//! Event signatures emitted by the cross-chain contract, and helpers for
//! reading fixed-width ABI words out of a log payload.
//!
//! | Event | Indexed topics | Payload words |
//! |-------|----------------|---------------|
//! | `MakerTx` | txId, from | remoteChainId, value, destValue, offset, len, bytes… |
//! | `TakerTx` | txId, to | remoteChainId, from, value, destValue, … |
//! | `MakerFinish` | txId, to | – |
//! | `AddAnchors` / `RemoveAnchors` | – | remoteChainId |

use crate::entities::{Hash, HASH_LENGTH, U256};
use crate::errors::DecodeError;
use std::sync::LazyLock;

/// `MakerTx` event signature.
pub const MAKER_SIGNATURE: &str = "MakerTx(bytes32,address,uint256,uint256,uint256,bytes)";
/// `TakerTx` event signature.
pub const TAKER_SIGNATURE: &str = "TakerTx(bytes32,address,uint256,address,uint256,uint256,bytes)";
/// `MakerFinish` event signature.
pub const MAKER_FINISH_SIGNATURE: &str = "MakerFinish(bytes32,address)";
/// `AddAnchors` event signature.
pub const ADD_ANCHORS_SIGNATURE: &str = "AddAnchors(uint256)";
/// `RemoveAnchors` event signature.
pub const REMOVE_ANCHORS_SIGNATURE: &str = "RemoveAnchors(uint256)";

static TOPIC_TABLE: LazyLock<[(Hash, TopicKind); 5]> = LazyLock::new(|| {
    [
        (crate::keccak256(MAKER_SIGNATURE), TopicKind::Maker),
        (crate::keccak256(TAKER_SIGNATURE), TopicKind::Taker),
        (crate::keccak256(MAKER_FINISH_SIGNATURE), TopicKind::MakerFinish),
        (crate::keccak256(ADD_ANCHORS_SIGNATURE), TopicKind::AddAnchors),
        (crate::keccak256(REMOVE_ANCHORS_SIGNATURE), TopicKind::RemoveAnchors),
    ]
});

/// Kind of a recognised cross-chain contract log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TopicKind {
    /// A cross transaction was created on this chain.
    Maker,
    /// A remote cross transaction was accepted on this chain.
    Taker,
    /// A cross transaction created on this chain was settled.
    MakerFinish,
    /// Anchors were added for a remote chain.
    AddAnchors,
    /// Anchors were removed for a remote chain.
    RemoveAnchors,
}

impl TopicKind {
    /// Classify a first topic, `None` for anything the relay ignores.
    #[must_use]
    pub fn classify(topic: &Hash) -> Option<Self> {
        TOPIC_TABLE
            .iter()
            .find(|(sig, _)| sig == topic)
            .map(|(_, kind)| *kind)
    }

    /// The 32-byte topic for this kind.
    #[must_use]
    pub fn topic(self) -> Hash {
        TOPIC_TABLE
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(sig, _)| *sig)
            .unwrap_or_default()
    }

    /// Whether logs of this kind wait for confirmation depth.
    #[must_use]
    pub fn needs_confirmation(self) -> bool {
        matches!(self, Self::Maker | Self::Taker | Self::MakerFinish)
    }
}

/// The `index`-th 32-byte word of an ABI payload.
pub fn word(data: &[u8], index: usize) -> Result<Hash, DecodeError> {
    let start = index * HASH_LENGTH;
    let end = start + HASH_LENGTH;
    let slice = data.get(start..end).ok_or(DecodeError::ShortPayload {
        expected: end,
        got: data.len(),
    })?;
    let mut out = [0u8; 32];
    out.copy_from_slice(slice);
    Ok(out)
}

/// The `index`-th word read as a big-endian unsigned integer.
pub fn word_u256(data: &[u8], index: usize) -> Result<U256, DecodeError> {
    word(data, index).map(|w| U256::from_big_endian(&w))
}

/// A dynamic `bytes` field whose head word sits at `head_index`.
pub fn dynamic_bytes(data: &[u8], head_index: usize) -> Result<Vec<u8>, DecodeError> {
    let offset = word_as_usize(data, head_index)?;
    let len_word = data
        .get(offset..offset + HASH_LENGTH)
        .ok_or(DecodeError::OutOfBounds {
            offset,
            len: HASH_LENGTH,
            payload: data.len(),
        })?;
    let len = usize_from_word(len_word).ok_or(DecodeError::OutOfBounds {
        offset,
        len: usize::MAX,
        payload: data.len(),
    })?;
    let start = offset + HASH_LENGTH;
    data.get(start..start.saturating_add(len))
        .map(<[u8]>::to_vec)
        .ok_or(DecodeError::OutOfBounds {
            offset: start,
            len,
            payload: data.len(),
        })
}

fn word_as_usize(data: &[u8], index: usize) -> Result<usize, DecodeError> {
    let w = word(data, index)?;
    usize_from_word(&w).ok_or(DecodeError::OutOfBounds {
        offset: usize::MAX,
        len: 0,
        payload: data.len(),
    })
}

fn usize_from_word(word: &[u8]) -> Option<usize> {
    let value = U256::from_big_endian(word);
    if value > U256::from(u32::MAX) {
        return None;
    }
    Some(value.low_u64() as usize)
}
