//! # Call Frame
//!
//! Everything an engine sees while running one call: the message, the
//! pinned header, the private state clone, a gas meter and the
//! cancellation checkpoint it must pass between steps.

use super::message::CallMessage;
use super::state::StateDb;
use crate::errors::VmError;
use shared_types::{Address, BlockHeader};
use tokio_util::sync::CancellationToken;

/// Steps a frame may take before `StepLimit`.
pub const DEFAULT_MAX_STEPS: u64 = 10_000_000;

/// Gas accounting for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasMeter {
    limit: u64,
    used: u64,
}

impl GasMeter {
    pub fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    pub fn charge(&mut self, amount: u64) -> Result<(), VmError> {
        let used = self.used.checked_add(amount).ok_or(VmError::OutOfGas)?;
        if used > self.limit {
            self.used = self.limit;
            return Err(VmError::OutOfGas);
        }
        self.used = used;
        Ok(())
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn remaining(&self) -> u64 {
        self.limit - self.used
    }
}

pub struct CallFrame<'a> {
    pub message: &'a CallMessage,
    pub header: &'a BlockHeader,
    pub state: &'a mut StateDb,
    gas: GasMeter,
    cancel: &'a CancellationToken,
    steps: u64,
    max_steps: u64,
}

impl<'a> CallFrame<'a> {
    pub fn new(
        message: &'a CallMessage,
        header: &'a BlockHeader,
        state: &'a mut StateDb,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            message,
            header,
            state,
            gas: GasMeter::new(message.gas),
            cancel,
            steps: 0,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    #[must_use]
    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// One execution step costing `gas`. Fails once the call is cancelled,
    /// out of gas or out of steps.
    pub fn step(&mut self, gas: u64) -> Result<(), VmError> {
        if self.cancel.is_cancelled() {
            return Err(VmError::Interrupted);
        }
        self.steps += 1;
        if self.steps > self.max_steps {
            return Err(VmError::StepLimit);
        }
        self.gas.charge(gas)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn caller(&self) -> Address {
        self.message.from
    }

    pub fn address(&self) -> Address {
        self.message.to
    }

    pub fn input(&self) -> &[u8] {
        &self.message.data
    }

    pub fn gas(&self) -> &GasMeter {
        &self.gas
    }

    pub fn gas_mut(&mut self) -> &mut GasMeter {
        &mut self.gas
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}
