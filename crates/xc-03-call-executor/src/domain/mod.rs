//! # Domain Module
//!
//! State clone, call message and the per-call execution frame.

pub mod frame;
pub mod message;
pub mod state;

pub use frame::{CallFrame, GasMeter, DEFAULT_MAX_STEPS};
pub use message::{CallMessage, CALL_GAS, CALL_GAS_PRICE};
pub use state::{Account, StateDb};
