//! # Ports
//!
//! - `inbound`: what callers of the executor program against
//! - `outbound`: the execution engine the executor drives

pub mod inbound;
pub mod outbound;

pub use inbound::ContractCaller;
pub use outbound::ExecutionEngine;
