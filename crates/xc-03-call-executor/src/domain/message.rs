//! # Call Message
//!
//! The synthetic message a verification call is made with.

use shared_types::{Address, U256};

/// Gas allowance of a verification call.
pub const CALL_GAS: u64 = u64::MAX / 2;

/// Gas price of a verification call: 1 GWei.
pub const CALL_GAS_PRICE: u64 = 1_000_000_000;

/// A zero-value call from `from` to `to` with calldata `selector ‖ args`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMessage {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub gas: u64,
    pub gas_price: U256,
    pub data: Vec<u8>,
}

impl CallMessage {
    pub fn new(from: Address, to: Address, selector: &[u8], args: &[&[u8]]) -> Self {
        let mut data = Vec::with_capacity(selector.len() + args.iter().map(|a| a.len()).sum::<usize>());
        data.extend_from_slice(selector);
        for arg in args {
            data.extend_from_slice(arg);
        }
        Self {
            from,
            to,
            value: U256::zero(),
            gas: CALL_GAS,
            gas_price: U256::from(CALL_GAS_PRICE),
            data,
        }
    }

    /// First four bytes of the calldata, if present.
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.data.get(..4)?.try_into().ok()
    }

    /// Calldata after the selector.
    pub fn args(&self) -> &[u8] {
        self.data.get(4..).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calldata_is_selector_then_args() {
        let msg = CallMessage::new([1; 20], [2; 20], &[0xde, 0xad, 0xbe, 0xef], &[&[1, 2], &[3]]);
        assert_eq!(msg.data, vec![0xde, 0xad, 0xbe, 0xef, 1, 2, 3]);
        assert_eq!(msg.selector(), Some([0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(msg.args(), &[1, 2, 3]);
        assert!(msg.value.is_zero());
        assert_eq!(msg.gas, u64::MAX / 2);
        assert_eq!(msg.gas_price, U256::from(1_000_000_000u64));
    }

    #[test]
    fn test_short_calldata_has_no_selector() {
        let msg = CallMessage::new([1; 20], [2; 20], &[0xde], &[]);
        assert_eq!(msg.selector(), None);
        assert!(msg.args().is_empty());
    }
}
