//! # Adapters

pub mod native;

pub use native::{NativeContract, NativeEngine, INTRINSIC_GAS};
