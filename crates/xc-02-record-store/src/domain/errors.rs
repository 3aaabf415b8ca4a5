//! # Domain Errors

use shared_types::{short_hex, Hash};
use thiserror::Error;

/// Errors raised by a key-value engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError { message: String },

    /// Data corruption in the store.
    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },
}

/// Errors surfaced by the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record with this id.
    #[error("Record not found: {}", short_hex(.0))]
    NotFound(Hash),

    /// The engine failed; the caller decides whether to retry.
    #[error("Storage failure while {context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: KVStoreError,
    },

    /// A record could not be encoded.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Stored bytes did not decode as a record.
    #[error("Corrupted record: {0}")]
    Corrupted(String),

    /// An update tried to change a record's identity.
    #[error("Update changed identity of record {}", short_hex(.0))]
    IdentityChanged(Hash),
}

impl StoreError {
    pub(crate) fn storage(context: &'static str) -> impl FnOnce(KVStoreError) -> Self {
        move |source| Self::Storage { context, source }
    }

    /// Whether this is a lookup miss rather than a failure.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
