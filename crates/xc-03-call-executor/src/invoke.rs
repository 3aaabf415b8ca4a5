//! # Chain Position Helpers
//!
//! Where a cross transaction sits on the local chain, and whether it is
//! old enough to expire.
//!
//! A transaction whose block hash the chain cannot resolve is placed at
//! the current head. That fallback cannot tell "not yet seen" from "old
//! and no longer indexed", so it can understate a transaction's age;
//! `locate` keeps the two cases apart for callers that care.

use shared_types::{BlockChain, CrossTransaction};
use std::sync::Arc;

/// Result of placing a transaction on the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPosition {
    /// The containing block is known at this height.
    Canonical(u64),
    /// The containing block is unknown; `head` is the current head height.
    Unresolved { head: u64 },
}

impl ChainPosition {
    /// Height to use for age arithmetic: the block height, else the head.
    pub fn number(self) -> u64 {
        match self {
            Self::Canonical(n) => n,
            Self::Unresolved { head } => head,
        }
    }

    pub fn is_resolved(self) -> bool {
        matches!(self, Self::Canonical(_))
    }
}

/// Chain position lookups over the local chain.
#[derive(Clone)]
pub struct ChainInvoke {
    chain: Arc<dyn BlockChain>,
}

impl ChainInvoke {
    pub fn new(chain: Arc<dyn BlockChain>) -> Self {
        Self { chain }
    }

    pub fn locate(&self, tx: &CrossTransaction) -> ChainPosition {
        match self.chain.block_number(&tx.block_hash) {
            Some(n) => ChainPosition::Canonical(n),
            None => ChainPosition::Unresolved {
                head: self.chain.current_number(),
            },
        }
    }

    /// Height of the block holding `tx`, or the head height if unknown.
    pub fn number_on_chain(&self, tx: &CrossTransaction) -> u64 {
        self.locate(tx).number()
    }

    /// Timestamp of the block holding `tx`, 0 if unknown.
    pub fn time_on_chain(&self, tx: &CrossTransaction) -> u64 {
        self.chain
            .header_by_hash(&tx.block_hash)
            .map_or(0, |h| h.timestamp)
    }

    /// Whether more than `threshold` blocks sit on top of `tx`.
    pub fn is_expired(&self, tx: &CrossTransaction, threshold: u64) -> bool {
        let head = self.chain.current_number();
        head.saturating_sub(self.number_on_chain(tx)) > threshold
    }
}
