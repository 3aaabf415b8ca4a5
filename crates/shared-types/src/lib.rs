//! # Shared Types Crate
//!
//! Primitive types that every relay subsystem speaks:
//!
//! - **Entities**: `Hash`, `Address`, `U256`, contract `Log`, `BlockHeader`
//! - **Topics**: the cross-chain contract event signatures and word-level
//!   payload helpers
//! - **Cross**: `CrossTransaction`, change descriptors and remote-chain info
//!   carried on the event bus
//! - **Chain**: the `BlockChain` collaborator port plus `MockChain`, an
//!   in-memory chain that can be extended and reorganised in tests
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: no subsystem redefines a primitive.
//! - **Chain access is a port**: nothing here talks to a node; hosts implement
//!   `BlockChain` over their own chain database.

pub mod chain;
pub mod cross;
pub mod entities;
pub mod errors;
pub mod topics;

pub use chain::{BlockChain, MockChain};
pub use cross::{CrossTransaction, CrossTransactionModifier, RemoteChainInfo};
pub use entities::*;
pub use errors::DecodeError;
pub use topics::TopicKind;
