//! # Cross-Chain Payloads
//!
//! Values decoded from contract logs and carried on the event bus.

use crate::entities::{short_hex, Address, Hash, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A cross transaction as created by a confirmed `MakerTx` log.
///
/// `id` is the content hash of the originating request and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CrossTransaction {
    pub id: Hash,
    pub tx_hash: Hash,
    pub block_hash: Hash,
    pub from: Address,
    pub value: U256,
    pub dest_value: U256,
    /// Chain the transaction was made on.
    pub chain_id: U256,
    /// Chain expected to take it.
    pub dest_chain_id: U256,
    pub data: Vec<u8>,
}

/// Transient change descriptor for one record: enough to locate and patch it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CrossTransactionModifier {
    /// Record identity.
    pub id: Hash,
    /// Chain whose store holds the record.
    pub chain_id: U256,
    /// Height at which the change was observed.
    pub at_block_number: u64,
}

impl fmt::Display for CrossTransactionModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} (chain {})",
            short_hex(&self.id),
            self.at_block_number,
            self.chain_id
        )
    }
}

/// Anchor-set membership change for a remote chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RemoteChainInfo {
    pub remote_chain_id: U256,
    pub block_number: u64,
}
