//! # Confirmation Buffer
//!
//! Ordered window of block-log batches waiting to be buried under the
//! confirmation depth. A batch leaves the window exactly once: promoted if
//! its hash is still canonical at its height, discarded otherwise.

use shared_types::{short_hex, BlockChain, Hash, Log};
use std::collections::VecDeque;
use tracing::{debug, trace, warn};

/// Blocks a log must survive before it is treated as final.
pub const DEFAULT_CONFIRM_DEPTH: u64 = 12;

/// Logs of one block awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingBatch {
    pub height: u64,
    pub hash: Hash,
    pub logs: Vec<Log>,
}

/// How a batch left the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShiftOutcome {
    /// Buried deep enough and still canonical.
    Confirmed(PendingBatch),
    /// Its block is no longer canonical at that height.
    Discarded {
        height: u64,
        expected: Hash,
        canonical: Hash,
    },
}

/// Pending batches in strictly increasing height order.
#[derive(Debug)]
pub struct UnconfirmedBlockLogs {
    depth: u64,
    batches: VecDeque<PendingBatch>,
}

impl UnconfirmedBlockLogs {
    #[must_use]
    pub fn new(depth: u64) -> Self {
        Self {
            depth,
            batches: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn depth(&self) -> u64 {
        self.depth
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Heights currently buffered, oldest first.
    #[must_use]
    pub fn pending_heights(&self) -> Vec<u64> {
        self.batches.iter().map(|b| b.height).collect()
    }

    /// Buffer the logs of block (`height`, `hash`), then promote or discard
    /// every batch that is now deep enough.
    ///
    /// A batch lands at its height's sorted position; batches above it are
    /// left to `shift`. A sibling at an already buffered height replaces the
    /// buffered batch unless the chain still reports the buffered hash as
    /// canonical, in which case the sibling is dropped.
    pub fn insert<C>(&mut self, chain: &C, height: u64, hash: Hash, logs: Vec<Log>) -> Vec<ShiftOutcome>
    where
        C: BlockChain + ?Sized,
    {
        let mut outcomes = Vec::new();

        if !logs.is_empty() {
            match self.batches.binary_search_by_key(&height, |b| b.height) {
                Ok(i) if self.batches[i].hash == hash => {
                    trace!("[xc-01] Ignoring duplicate batch at height {}", height);
                }
                Ok(i) => {
                    let canonical = chain.canonical_hash(height);
                    if canonical == Some(self.batches[i].hash) {
                        debug!(
                            "[xc-01] Ignoring non-canonical sibling {} at height {}",
                            short_hex(&hash),
                            height
                        );
                    } else {
                        let old = std::mem::replace(
                            &mut self.batches[i],
                            PendingBatch { height, hash, logs },
                        );
                        warn!(
                            "[xc-01] Batch at height {} ({}) replaced by {}",
                            height,
                            short_hex(&old.hash),
                            short_hex(&hash)
                        );
                        outcomes.push(ShiftOutcome::Discarded {
                            height,
                            expected: old.hash,
                            canonical: canonical.unwrap_or(hash),
                        });
                    }
                }
                Err(i) => self.batches.insert(i, PendingBatch { height, hash, logs }),
            }
        }

        outcomes.extend(self.shift(chain));
        outcomes
    }

    /// Promote or discard every batch buried at least `depth` blocks under
    /// the current head, oldest first.
    ///
    /// Stops at the first height the chain cannot resolve yet; that batch and
    /// everything above it are retried on the next call.
    pub fn shift<C>(&mut self, chain: &C) -> Vec<ShiftOutcome>
    where
        C: BlockChain + ?Sized,
    {
        let head = chain.current_number();
        let mut outcomes = Vec::new();

        while let Some(oldest) = self.batches.front() {
            if oldest.height > head || head - oldest.height < self.depth {
                break;
            }
            let Some(canonical) = chain.canonical_hash(oldest.height) else {
                debug!(
                    "[xc-01] Height {} not resolvable yet (head {}), keeping {} pending batches",
                    oldest.height,
                    head,
                    self.batches.len()
                );
                break;
            };
            let Some(batch) = self.batches.pop_front() else {
                break;
            };

            if canonical == batch.hash {
                debug!(
                    "[xc-01] Confirmed {} logs at height {}",
                    batch.logs.len(),
                    batch.height
                );
                outcomes.push(ShiftOutcome::Confirmed(batch));
            } else {
                warn!(
                    "[xc-01] Reorg at height {}: dropping {} logs of {} (canonical {})",
                    batch.height,
                    batch.logs.len(),
                    short_hex(&batch.hash),
                    short_hex(&canonical)
                );
                outcomes.push(ShiftOutcome::Discarded {
                    height: batch.height,
                    expected: batch.hash,
                    canonical,
                });
            }
        }

        outcomes
    }
}

impl Default for UnconfirmedBlockLogs {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIRM_DEPTH)
    }
}
