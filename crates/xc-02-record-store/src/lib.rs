//! # XC-02 Cross-Transaction Record Store
//!
//! Durable, indexed repository of cross-transaction records.
//!
//! **Subsystem ID:** 2
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Storage Layout
//!
//! One ordered key-value engine holds both tiers:
//!
//! | Key | Value |
//! |-----|-------|
//! | `r:` ‖ id | bincode record |
//! | `i:` ‖ field tag ‖ fixed-width value ‖ id | empty |
//!
//! Index values are big-endian and fixed-width per field, so key order is
//! numeric order and a prefix scan of one field yields records sorted by
//! that field, ties broken by id.
//!
//! ## Guarantees
//!
//! - `write` is idempotent by id; `delete` of an absent id is not an error
//! - read-modify-write via `update` is serialised per id only
//! - every write touching a record and its index entries is one atomic batch
//! - the LRU cache is write-through and invalidated on update/delete
//!
//! ## Module Structure
//!
//! ```text
//! xc-02-record-store/
//! ├── domain/          # Record model, index values, filters, key layout, errors
//! ├── ports/           # KeyValueStore (driven port)
//! ├── adapters/        # InMemoryKVStore, RocksDbStore (feature "rocksdb")
//! ├── open.rs          # open-by-name over a data directory
//! └── service.rs       # RecordStore
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod open;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::InMemoryKVStore;
#[cfg(feature = "rocksdb")]
pub use adapters::RocksDbStore;
pub use domain::{
    Comparison, CrossTransactionWithSignatures, CtxStatus, FieldName, Filter, IndexValue,
    KVStoreError, RepairReport, StoreError,
};
pub use open::{open_store, KvConfig, StoreContext};
pub use ports::{BatchOperation, KeyValueStore};
pub use service::{RecordStore, DEFAULT_CACHE_SIZE};
