//! # Error Types
//!
//! Decoding errors for contract payloads.

use thiserror::Error;

/// A contract log or payload did not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Too few indexed topics.
    #[error("expected at least {expected} topics, got {got}")]
    MissingTopics { expected: usize, got: usize },

    /// Payload shorter than the fixed-width head.
    #[error("payload too short: need {expected} bytes, got {got}")]
    ShortPayload { expected: usize, got: usize },

    /// A dynamic field points outside the payload.
    #[error("dynamic field out of bounds: offset {offset}, len {len}, payload {payload}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        payload: usize,
    },
}
