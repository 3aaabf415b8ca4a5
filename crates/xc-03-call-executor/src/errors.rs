//! # Error Types
//!
//! Engine failures and the outcomes a caller of the executor can see.

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// VM ERRORS
// =============================================================================

/// Errors raised by an execution engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    /// Execution reverted with the given return data.
    #[error("execution reverted ({} bytes of output)", output.len())]
    Reverted { output: Vec<u8> },

    /// Gas allowance exhausted.
    #[error("out of gas")]
    OutOfGas,

    /// The cancellation token fired between steps.
    #[error("execution interrupted")]
    Interrupted,

    /// Step budget of the frame exhausted.
    #[error("step limit reached")]
    StepLimit,

    /// State access failed.
    #[error("state error: {0}")]
    State(String),
}

// =============================================================================
// INVOKE ERRORS
// =============================================================================

/// Outcome of a failed `CallExecutor::call`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvokeError {
    /// The call ran and failed; the claim it checked is invalid.
    #[error("call failed: {0}")]
    Execution(#[from] VmError),

    /// The deadline passed first; the outcome is unknown.
    #[error("call cancelled after {timeout:?}")]
    Cancelled { timeout: Duration },

    /// The engine task panicked or was aborted.
    #[error("execution engine crashed: {0}")]
    EngineCrashed(String),
}

impl InvokeError {
    /// The deadline expired. Retry or escalate; never treat as invalid.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// The call itself failed (revert, out of gas, engine error).
    #[must_use]
    pub fn is_verification_failure(&self) -> bool {
        matches!(self, Self::Execution(_))
    }
}
