//! # Domain Module
//!
//! Record model, secondary-index values, query filters and the key layout.

pub mod errors;
pub mod filter;
pub mod keys;
pub mod record;
pub mod repair;

pub use errors::*;
pub use filter::*;
pub use record::*;
pub use repair::RepairReport;
