//! # Driving Port (API - Inbound)

use crate::errors::InvokeError;
use async_trait::async_trait;
use shared_types::Address;

/// Read-only contract calls used to check cross-chain claims.
///
/// `Err(InvokeError::Cancelled { .. })` means the outcome is unknown;
/// every other error means the claim did not verify.
#[async_trait]
pub trait ContractCaller: Send + Sync {
    /// Call `to` with calldata `selector ‖ args` as `from`, returning the
    /// raw output bytes.
    async fn call(
        &self,
        from: Address,
        to: Address,
        selector: &[u8],
        args: &[&[u8]],
    ) -> Result<Vec<u8>, InvokeError>;
}
