//! # Cross-Chain Relay Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Contract log builders, block feeding helpers
//! └── integration/      # Cross-subsystem flows
//!     ├── flows.rs          # maker -> taker -> finish through the relay
//!     ├── reorg.rs          # forks before confirmation
//!     ├── shutdown.rs       # stop semantics, event ordering
//!     └── verification.rs   # call executor against chain state
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p xc-tests
//! cargo test -p xc-tests --features rocksdb   # durable store restart
//! ```

pub mod fixtures;
pub mod integration;
