//! # Record Model
//!
//! A cross transaction plus the anchor signatures collected for it and its
//! lifecycle status. Identity is the id of the wrapped transaction.

use serde::{Deserialize, Serialize};
use shared_types::{Address, CrossTransaction, Hash, U256};
use std::cmp::Ordering;
use std::fmt;

/// Lifecycle status of a cross transaction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[repr(u8)]
pub enum CtxStatus {
    /// Made on this chain, waiting for a taker.
    #[default]
    Created = 0,
    /// Taken on the remote chain.
    Taken = 1,
    /// Settled back on the maker chain.
    Finished = 2,
}

impl fmt::Display for CtxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Taken => write!(f, "taken"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// The stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CrossTransactionWithSignatures {
    pub data: CrossTransaction,
    /// Anchor signatures, one per anchor, in arrival order.
    pub signatures: Vec<Vec<u8>>,
    pub status: CtxStatus,
    /// Height the record was last observed at.
    pub block_num: u64,
}

impl CrossTransactionWithSignatures {
    /// Wrap a freshly made transaction.
    #[must_use]
    pub fn new(data: CrossTransaction, block_num: u64) -> Self {
        Self {
            data,
            signatures: Vec::new(),
            status: CtxStatus::Created,
            block_num,
        }
    }

    #[must_use]
    pub fn id(&self) -> Hash {
        self.data.id
    }

    #[must_use]
    pub fn chain_id(&self) -> U256 {
        self.data.chain_id
    }

    #[must_use]
    pub fn dest_chain_id(&self) -> U256 {
        self.data.dest_chain_id
    }

    #[must_use]
    pub fn value(&self) -> U256 {
        self.data.value
    }

    #[must_use]
    pub fn from_address(&self) -> Address {
        self.data.from
    }

    /// Add an anchor signature. Returns `false` if it was already present.
    pub fn add_signature(&mut self, signature: Vec<u8>) -> bool {
        if self.signatures.contains(&signature) {
            return false;
        }
        self.signatures.push(signature);
        true
    }

    #[must_use]
    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }
}

/// Queryable record fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldName {
    /// Primary key.
    CtxId,
    Status,
    From,
    BlockNum,
    DestChainId,
    Value,
}

impl FieldName {
    /// Fields that carry a secondary index.
    pub const INDEXED: [FieldName; 5] = [
        FieldName::Status,
        FieldName::From,
        FieldName::BlockNum,
        FieldName::DestChainId,
        FieldName::Value,
    ];

    /// One-byte tag used in index keys.
    #[must_use]
    pub fn tag(self) -> u8 {
        match self {
            Self::CtxId => b'k',
            Self::Status => b's',
            Self::From => b'f',
            Self::BlockNum => b'n',
            Self::DestChainId => b'd',
            Self::Value => b'v',
        }
    }

    /// Whether the field has a secondary index (everything but the key).
    #[must_use]
    pub fn is_indexed(self) -> bool {
        self != Self::CtxId
    }

    /// This field's value on a record.
    #[must_use]
    pub fn value_of(self, record: &CrossTransactionWithSignatures) -> IndexValue {
        match self {
            Self::CtxId => IndexValue::Id(record.id()),
            Self::Status => IndexValue::Status(record.status),
            Self::From => IndexValue::Address(record.from_address()),
            Self::BlockNum => IndexValue::Number(record.block_num),
            Self::DestChainId => IndexValue::Big(record.dest_chain_id()),
            Self::Value => IndexValue::Big(record.value()),
        }
    }
}

/// A field value as stored in an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexValue {
    Id(Hash),
    Status(CtxStatus),
    Address(Address),
    Number(u64),
    Big(U256),
}

impl IndexValue {
    /// Fixed-width big-endian encoding; byte order equals value order.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Id(hash) => hash.to_vec(),
            Self::Status(status) => vec![*status as u8],
            Self::Address(address) => address.to_vec(),
            Self::Number(n) => n.to_be_bytes().to_vec(),
            Self::Big(n) => {
                let mut word = [0u8; 32];
                n.to_big_endian(&mut word);
                word.to_vec()
            }
        }
    }

    /// Compare two values of the same kind. Integers of either width compare
    /// numerically; anything else of a different kind is incomparable.
    #[must_use]
    pub fn compare(&self, other: &IndexValue) -> Option<Ordering> {
        match (self, other) {
            (Self::Id(a), Self::Id(b)) => Some(a.cmp(b)),
            (Self::Status(a), Self::Status(b)) => Some(a.cmp(b)),
            (Self::Address(a), Self::Address(b)) => Some(a.cmp(b)),
            (Self::Number(a), Self::Number(b)) => Some(a.cmp(b)),
            (Self::Big(a), Self::Big(b)) => Some(a.cmp(b)),
            (Self::Number(a), Self::Big(b)) => Some(U256::from(*a).cmp(b)),
            (Self::Big(a), Self::Number(b)) => Some(a.cmp(&U256::from(*b))),
            _ => None,
        }
    }

    /// Re-encode an integer to the width `field` stores, so it can be used
    /// in an index key.
    #[must_use]
    pub fn for_field(self, field: FieldName) -> Option<IndexValue> {
        match (field, self) {
            (FieldName::CtxId, Self::Id(_))
            | (FieldName::Status, Self::Status(_))
            | (FieldName::From, Self::Address(_))
            | (FieldName::BlockNum, Self::Number(_))
            | (FieldName::DestChainId | FieldName::Value, Self::Big(_)) => Some(self),
            (FieldName::DestChainId | FieldName::Value, Self::Number(n)) => {
                Some(Self::Big(U256::from(n)))
            }
            (FieldName::BlockNum, Self::Big(n)) if n <= U256::from(u64::MAX) => {
                Some(Self::Number(n.low_u64()))
            }
            _ => None,
        }
    }
}

impl From<Hash> for IndexValue {
    fn from(value: Hash) -> Self {
        Self::Id(value)
    }
}

impl From<CtxStatus> for IndexValue {
    fn from(value: CtxStatus) -> Self {
        Self::Status(value)
    }
}

impl From<Address> for IndexValue {
    fn from(value: Address) -> Self {
        Self::Address(value)
    }
}

impl From<u64> for IndexValue {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<U256> for IndexValue {
    fn from(value: U256) -> Self {
        Self::Big(value)
    }
}
