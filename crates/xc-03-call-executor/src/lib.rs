//! # XC-03 Sandboxed Call Executor
//!
//! Runs read-only contract calls against a header-pinned, copy-on-write
//! clone of chain state, bounded by a wall-clock deadline, plus the helpers
//! that place a cross transaction on the local chain.
//!
//! **Subsystem ID:** 3
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Call Semantics
//!
//! | Property | Value |
//! |----------|-------|
//! | Message value | 0 |
//! | Gas allowance | `u64::MAX / 2` |
//! | Gas price | 1 GWei |
//! | Sender balance (in the clone) | `U256::MAX` |
//! | Deadline | 30 s (`CallExecutor::with_timeout` to change) |
//!
//! The engine runs on the blocking pool and checks a cancellation token at
//! every step. When the deadline passes the token is cancelled and the
//! caller gets `InvokeError::Cancelled` at once; the engine winds down on
//! its own. Cancellation means "unknown", never "invalid".
//!
//! ## Module Structure
//!
//! ```text
//! xc-03-call-executor/
//! ├── domain/     # StateDb (layered COW), CallMessage, CallFrame, gas meter
//! ├── ports/      # ContractCaller (inbound), ExecutionEngine (outbound)
//! ├── adapters/   # NativeEngine: address -> native contract registry
//! ├── errors.rs   # VmError, InvokeError
//! ├── invoke.rs   # ChainInvoke, ChainPosition
//! └── service.rs  # CallExecutor
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod errors;
pub mod invoke;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{NativeContract, NativeEngine};
pub use domain::{Account, CallFrame, CallMessage, GasMeter, StateDb, CALL_GAS, CALL_GAS_PRICE};
pub use errors::{InvokeError, VmError};
pub use invoke::{ChainInvoke, ChainPosition};
pub use ports::{ContractCaller, ExecutionEngine};
pub use service::{CallExecutor, DEFAULT_CALL_TIMEOUT};
