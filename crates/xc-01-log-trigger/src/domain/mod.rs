//! # Domain Module
//!
//! Confirmation buffer and contract log decoding.

pub mod decode;
pub mod unconfirmed;

pub use decode::*;
pub use unconfirmed::*;
