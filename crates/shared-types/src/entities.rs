//! # Core Chain Entities
//!
//! The few chain-level types the relay core consumes from its host node.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

// Re-export U256 from primitive-types for use across all subsystems
pub use primitive_types::U256;

/// A 32-byte Keccak-256 hash.
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

/// Width of one ABI word in bytes.
pub const HASH_LENGTH: usize = 32;

/// The all-zero hash.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Keccak-256 of arbitrary bytes.
#[must_use]
pub fn keccak256(data: impl AsRef<[u8]>) -> Hash {
    Keccak256::digest(data.as_ref()).into()
}

/// Short hex rendering used in log lines (`0x1234abcd…`).
#[must_use]
pub fn short_hex(bytes: &[u8]) -> String {
    let shown = bytes.len().min(4);
    format!("0x{}…", hex::encode(&bytes[..shown]))
}

/// A contract event log as produced by block execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Log {
    /// Address of the contract that emitted the log.
    pub address: Address,
    /// Indexed topics; `topics[0]` is the event signature.
    pub topics: Vec<Hash>,
    /// Non-indexed ABI-encoded payload.
    pub data: Vec<u8>,
    /// Height of the block containing the log.
    pub block_number: u64,
    /// Hash of the transaction that emitted the log.
    pub tx_hash: Hash,
    /// Hash of the block containing the log.
    pub block_hash: Hash,
    /// Position of the log within the block.
    pub index: u32,
}

impl Log {
    /// Event signature (first topic), if any.
    #[must_use]
    pub fn signature(&self) -> Option<&Hash> {
        self.topics.first()
    }
}

/// The header fields the relay reads from the host chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockHeader {
    /// Block height in the chain.
    pub number: u64,
    /// Hash of the parent block.
    pub parent_hash: Hash,
    /// Root hash of the state after applying this block.
    pub state_root: Hash,
    /// Unix timestamp when the block was sealed.
    pub timestamp: u64,
    /// Beneficiary of the block.
    pub coinbase: Address,
    /// Free-form extra data; distinguishes sibling blocks at the same height.
    pub extra: Vec<u8>,
}

impl BlockHeader {
    /// Identity hash of the header.
    #[must_use]
    pub fn hash(&self) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(self.number.to_be_bytes());
        hasher.update(self.parent_hash);
        hasher.update(self.state_root);
        hasher.update(self.timestamp.to_be_bytes());
        hasher.update(self.coinbase);
        hasher.update(&self.extra);
        hasher.finalize().into()
    }
}

/// Big-endian 32-byte word of a `U256`.
#[must_use]
pub fn u256_to_word(value: &U256) -> Hash {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}

/// Left-pads an address into a 32-byte word.
#[must_use]
pub fn address_to_word(address: &Address) -> Hash {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address);
    word
}

/// The low 20 bytes of a 32-byte word.
#[must_use]
pub fn word_to_address(word: &Hash) -> Address {
    let mut address = [0u8; 20];
    address.copy_from_slice(&word[12..]);
    address
}
