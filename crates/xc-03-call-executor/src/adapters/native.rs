//! # Native Contract Engine
//!
//! Executes calls against contracts written in Rust and registered by
//! address. A call to an address with no registered contract succeeds with
//! empty output, as a call to a plain account does.

use crate::domain::CallFrame;
use crate::errors::VmError;
use crate::ports::ExecutionEngine;
use shared_types::{short_hex, Address};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Base gas charged for every call.
pub const INTRINSIC_GAS: u64 = 21_000;
const GAS_PER_ZERO_BYTE: u64 = 4;
const GAS_PER_NONZERO_BYTE: u64 = 16;

/// Contract logic invoked by `NativeEngine`.
pub trait NativeContract: Send + Sync {
    fn call(&self, frame: &mut CallFrame<'_>) -> Result<Vec<u8>, VmError>;
}

impl<F> NativeContract for F
where
    F: Fn(&mut CallFrame<'_>) -> Result<Vec<u8>, VmError> + Send + Sync,
{
    fn call(&self, frame: &mut CallFrame<'_>) -> Result<Vec<u8>, VmError> {
        self(frame)
    }
}

/// Address → native contract registry.
#[derive(Default, Clone)]
pub struct NativeEngine {
    contracts: HashMap<Address, Arc<dyn NativeContract>>,
}

impl NativeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_contract(mut self, address: Address, contract: impl NativeContract + 'static) -> Self {
        self.register(address, contract);
        self
    }

    pub fn register(&mut self, address: Address, contract: impl NativeContract + 'static) {
        self.contracts.insert(address, Arc::new(contract));
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.contracts.contains_key(address)
    }

    fn intrinsic_gas(data: &[u8]) -> u64 {
        data.iter().fold(INTRINSIC_GAS, |gas, byte| {
            gas.saturating_add(if *byte == 0 {
                GAS_PER_ZERO_BYTE
            } else {
                GAS_PER_NONZERO_BYTE
            })
        })
    }
}

impl ExecutionEngine for NativeEngine {
    fn execute(&self, frame: &mut CallFrame<'_>) -> Result<Vec<u8>, VmError> {
        frame.step(Self::intrinsic_gas(frame.input()))?;

        let (from, to, value) = (frame.message.from, frame.message.to, frame.message.value);
        if !value.is_zero() {
            if !frame.state.sub_balance(&from, value) {
                return Err(VmError::State(format!(
                    "insufficient balance in {}",
                    short_hex(&from)
                )));
            }
            frame.state.add_balance(&to, value);
        }
        let nonce = frame.state.nonce(&from);
        frame.state.set_nonce(&from, nonce.saturating_add(1));

        let Some(contract) = self.contracts.get(&to) else {
            trace!("[xc-03] No contract at {}, empty result", short_hex(&to));
            return Ok(Vec::new());
        };
        contract.call(frame)
    }
}
