//! # Ports Module
//!
//! Driven port the record store runs on.

pub mod outbound;

pub use outbound::*;
