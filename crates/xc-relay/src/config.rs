//! # Relay Configuration
//!
//! One immutable `RelayConfig` is built at startup (usually from
//! `RelayConfig::default()`), sanitised, and passed into every constructor.
//!
//! ## Floors
//!
//! | Field | Floor | On violation |
//! |-------|-------|--------------|
//! | `rejournal` | 1 s | clamped to 1 s |
//! | `value_limit` | 1e18 | reset to the default |

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use shared_types::{Address, U256};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Default journal flush interval.
pub const DEFAULT_REJOURNAL: Duration = Duration::from_secs(10 * 60);
/// Smallest journal flush interval accepted.
pub const MIN_REJOURNAL: Duration = Duration::from_secs(1);

/// Smallest (and default) value a cross transaction must carry: 1e18.
pub fn default_value_limit() -> U256 {
    U256::exp10(18)
}

/// Relay configuration.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Local chain id. Zero means "take it from the chain".
    pub chain_id: U256,
    /// Cross-chain contract whose logs are watched.
    pub contract: Address,
    /// Addresses allowed to sign cross transactions.
    pub anchors: Vec<Address>,
    /// Whether this node is itself an anchor.
    pub is_anchor: bool,
    /// Journal flush interval.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub rejournal: Duration,
    /// Minimum value to accept; `None` means unset.
    pub value_limit: Option<U256>,
    /// Executable slots guaranteed per account.
    pub account_slots: u64,
    /// Executable slots for all accounts.
    pub global_slots: u64,
    /// Non-executable slots per account.
    pub account_queue: u64,
    /// Non-executable slots for all accounts.
    pub global_queue: u64,
    /// Blocks a log must be buried under before it is confirmed.
    pub confirm_depth: u64,
    /// Deadline of one verification call.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub call_timeout: Duration,
    /// Records cached per store.
    pub store_cache_size: usize,
    /// Root of durable stores; `None` keeps stores in memory.
    pub data_dir: Option<PathBuf>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            chain_id: U256::zero(),
            contract: [0u8; 20],
            anchors: Vec::new(),
            is_anchor: false,
            rejournal: DEFAULT_REJOURNAL,
            value_limit: Some(default_value_limit()),
            account_slots: 5,
            global_slots: 4096,
            account_queue: 5,
            global_queue: 10,
            confirm_depth: xc_01_log_trigger::DEFAULT_CONFIRM_DEPTH,
            call_timeout: xc_03_call_executor::DEFAULT_CALL_TIMEOUT,
            store_cache_size: xc_02_record_store::DEFAULT_CACHE_SIZE,
            data_dir: None,
        }
    }
}

impl RelayConfig {
    /// Copy of the config with out-of-range values replaced.
    ///
    /// `rejournal` below one second is clamped to one second; a missing or
    /// too small `value_limit` is reset to the default. Nothing else changes.
    #[must_use]
    pub fn sanitize(&self) -> Self {
        let mut conf = self.clone();
        if conf.rejournal < MIN_REJOURNAL {
            warn!(
                provided = ?conf.rejournal,
                updated = ?MIN_REJOURNAL,
                "[xc-relay] Sanitizing invalid journal time"
            );
            conf.rejournal = MIN_REJOURNAL;
        }
        let floor = default_value_limit();
        if conf.value_limit.map_or(true, |limit| limit < floor) {
            warn!(
                provided = ?conf.value_limit,
                updated = %floor,
                "[xc-relay] Sanitizing invalid value limit"
            );
            conf.value_limit = Some(floor);
        }
        conf
    }

    /// Reject settings no amount of sanitising can repair.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.confirm_depth == 0 {
            return Err(ConfigError::ZeroConfirmDepth);
        }
        if self.call_timeout.is_zero() {
            return Err(ConfigError::ZeroCallTimeout);
        }
        if self.is_anchor && self.anchors.is_empty() {
            return Err(ConfigError::EmptyAnchorSet);
        }
        Ok(())
    }

    /// Settle `chain_id` against the chain the relay runs on.
    pub fn resolve_chain_id(&self, actual: U256) -> Result<U256, ConfigError> {
        if self.chain_id.is_zero() || self.chain_id == actual {
            Ok(actual)
        } else {
            Err(ConfigError::ChainIdMismatch {
                configured: self.chain_id,
                actual,
            })
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("confirmation depth must be at least 1")]
    ZeroConfirmDepth,

    #[error("call timeout must be non-zero")]
    ZeroCallTimeout,

    #[error("node is configured as an anchor but the anchor set is empty")]
    EmptyAnchorSet,

    #[error("configured chain id {configured} does not match chain {actual}")]
    ChainIdMismatch { configured: U256, actual: U256 },
}
