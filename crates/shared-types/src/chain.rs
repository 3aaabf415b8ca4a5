//! # Chain Collaborator Port
//!
//! The read-only view of the host chain the relay needs: head height,
//! canonical headers by height, and header/height lookup by hash.
//!
//! Production: the host node's chain database.
//! Testing: `MockChain` (below), which can grow, fork and lag behind its
//! reported head.

use crate::entities::{BlockHeader, Hash, U256};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only access to the local chain.
pub trait BlockChain: Send + Sync {
    /// Identity of the local chain.
    fn chain_id(&self) -> U256;

    /// Height of the current head block.
    fn current_number(&self) -> u64;

    /// Canonical header at `number`, `None` if not (yet) known.
    fn header_by_number(&self, number: u64) -> Option<BlockHeader>;

    /// Header with the given hash, canonical or not.
    fn header_by_hash(&self, hash: &Hash) -> Option<BlockHeader>;

    /// Height of the block with the given hash.
    fn block_number(&self, hash: &Hash) -> Option<u64> {
        self.header_by_hash(hash).map(|h| h.number)
    }

    /// Hash of the canonical block at `number`.
    fn canonical_hash(&self, number: u64) -> Option<Hash> {
        self.header_by_number(number).map(|h| h.hash())
    }
}

impl<T: BlockChain + ?Sized> BlockChain for Arc<T> {
    fn chain_id(&self) -> U256 {
        (**self).chain_id()
    }

    fn current_number(&self) -> u64 {
        (**self).current_number()
    }

    fn header_by_number(&self, number: u64) -> Option<BlockHeader> {
        (**self).header_by_number(number)
    }

    fn header_by_hash(&self, hash: &Hash) -> Option<BlockHeader> {
        (**self).header_by_hash(hash)
    }

    fn block_number(&self, hash: &Hash) -> Option<u64> {
        (**self).block_number(hash)
    }

    fn canonical_hash(&self, number: u64) -> Option<Hash> {
        (**self).canonical_hash(number)
    }
}

// =============================================================================
// Mock Implementation for Testing
// =============================================================================

#[derive(Default)]
struct MockChainInner {
    canonical: Vec<BlockHeader>,
    known: HashMap<Hash, BlockHeader>,
    reported_head: Option<u64>,
}

/// In-memory chain for tests.
///
/// Starts with a genesis block at height 0. Blocks replaced by `reorg`
/// stay resolvable by hash, the way a node keeps side-chain headers.
pub struct MockChain {
    chain_id: U256,
    inner: RwLock<MockChainInner>,
}

impl MockChain {
    /// Create a chain holding only genesis.
    pub fn new(chain_id: impl Into<U256>) -> Self {
        let chain = Self {
            chain_id: chain_id.into(),
            inner: RwLock::new(MockChainInner::default()),
        };
        chain.push_header(BlockHeader::default());
        chain
    }

    /// Append `count` canonical blocks and return their headers.
    pub fn extend(&self, count: u64) -> Vec<BlockHeader> {
        self.extend_with_tag(count, Vec::new())
    }

    /// Replace every canonical block from `from` upward with a sibling
    /// chain of the same length, tagged with `fork`.
    pub fn reorg(&self, from: u64, fork: u8) -> Vec<BlockHeader> {
        let replaced = {
            let mut inner = self.inner.write();
            let keep = (from as usize).clamp(1, inner.canonical.len());
            let replaced = inner.canonical.len() - keep;
            inner.canonical.truncate(keep);
            replaced as u64
        };
        self.extend_with_tag(replaced, vec![fork])
    }

    /// Pretend the node has seen a head at `number` without having its
    /// headers yet (`None` restores the real head).
    pub fn set_reported_head(&self, number: Option<u64>) {
        self.inner.write().reported_head = number;
    }

    /// The canonical head header.
    pub fn head(&self) -> BlockHeader {
        self.inner
            .read()
            .canonical
            .last()
            .cloned()
            .unwrap_or_default()
    }

    /// Canonical header at `number`, for building test fixtures.
    pub fn header_at(&self, number: u64) -> Option<BlockHeader> {
        self.inner.read().canonical.get(number as usize).cloned()
    }

    fn extend_with_tag(&self, count: u64, extra: Vec<u8>) -> Vec<BlockHeader> {
        (0..count)
            .map(|_| {
                let parent = self.head();
                let header = BlockHeader {
                    number: parent.number + 1,
                    parent_hash: parent.hash(),
                    timestamp: 1_700_000_000 + (parent.number + 1) * 5,
                    extra: extra.clone(),
                    ..Default::default()
                };
                self.push_header(header.clone());
                header
            })
            .collect()
    }

    fn push_header(&self, header: BlockHeader) {
        let mut inner = self.inner.write();
        inner.known.insert(header.hash(), header.clone());
        inner.canonical.push(header);
    }
}

impl BlockChain for MockChain {
    fn chain_id(&self) -> U256 {
        self.chain_id
    }

    fn current_number(&self) -> u64 {
        let inner = self.inner.read();
        inner
            .reported_head
            .unwrap_or_else(|| inner.canonical.len().saturating_sub(1) as u64)
    }

    fn header_by_number(&self, number: u64) -> Option<BlockHeader> {
        self.header_at(number)
    }

    fn header_by_hash(&self, hash: &Hash) -> Option<BlockHeader> {
        self.inner.read().known.get(hash).cloned()
    }
}
