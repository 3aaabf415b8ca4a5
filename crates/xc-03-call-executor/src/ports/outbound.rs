//! # Driven Port (SPI - Outbound)

use crate::domain::CallFrame;
use crate::errors::VmError;

/// A synchronous execution engine.
///
/// Runs on the blocking pool. Implementations must call
/// `CallFrame::step` between units of work so cancellation and gas are
/// observed; state writes go to `frame.state`, which is a private clone.
pub trait ExecutionEngine: Send + Sync {
    fn execute(&self, frame: &mut CallFrame<'_>) -> Result<Vec<u8>, VmError>;
}
