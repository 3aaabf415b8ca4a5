//! # Cross-Chain Relay Runtime
//!
//! Startup and wiring for the relay subsystems.
//!
//! ## Modular Structure
//!
//! - `config` - `RelayConfig`, defaults and sanitisation
//! - `router` - one `RecordStore` per chain id
//! - `handler` - applies confirmed events to the stores
//! - `relay` - owns the trigger, stores and handler task
//! - `telemetry` - tracing subscriber setup
//!
//! ## Flow
//!
//! ```text
//! new block ──→ CrossTrigger (xc-01) ──immediate──→ subscribers
//!                     │
//!              [confirmation depth]
//!                     ↓
//!              confirmed events ──→ RecordStoreHandler ──→ RecordStore (xc-02)
//!                                          │
//!                                   ChainInvoke (xc-03)
//! ```

pub mod config;
pub mod handler;
pub mod relay;
pub mod router;
pub mod telemetry;

pub use config::{ConfigError, RelayConfig};
pub use handler::{HandleSummary, RecordStoreHandler};
pub use relay::Relay;
pub use router::StoreRouter;
pub use telemetry::init_tracing;
