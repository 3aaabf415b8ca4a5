//! # XC-01 Cross-Chain Log Trigger
//!
//! Turns raw contract logs from new blocks into cross-chain events.
//!
//! **Subsystem ID:** 1
//! **Architecture:** Hexagonal (domain + service)
//!
//! ## Purpose
//!
//! - Classify logs of the cross-chain contract by topic
//! - Publish taker, finish and anchor changes as soon as they are seen
//! - Hold maker, taker and finish logs until their block is buried under the
//!   confirmation depth, then publish them as confirmed if the block is still
//!   canonical, or drop them silently if it was reorganised away
//!
//! ## Module Structure
//!
//! ```text
//! xc-01-log-trigger/
//! ├── domain/          # Pending batches, confirmation buffer, log decoding
//! └── service.rs       # CrossTrigger: classification and event fan-out
//! ```

#![warn(clippy::all)]

pub mod domain;
pub mod service;

// Re-exports
pub use domain::{
    decode_anchor, decode_finish, decode_maker, decode_taker, PendingBatch, ShiftOutcome,
    UnconfirmedBlockLogs, DEFAULT_CONFIRM_DEPTH,
};
pub use service::{ClassifySummary, CrossTrigger};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
