//! Cross-subsystem flows.

mod flows;
mod reorg;
mod shutdown;
mod verification;
