//! # Opening Stores
//!
//! Resolves a store name under the configured data directory and opens it
//! on the matching engine, then rebuilds its indexes.

use crate::adapters::InMemoryKVStore;
use crate::domain::StoreError;
use crate::ports::KeyValueStore;
use crate::service::{RecordStore, DEFAULT_CACHE_SIZE};
use shared_types::U256;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Engine tuning for durable stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvConfig {
    /// Path to the database directory
    pub path: PathBuf,
    /// Block cache size in bytes (default: 64MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 16MB)
    pub write_buffer_size: usize,
    /// Maximum number of write buffers (default: 3)
    pub max_write_buffer_number: i32,
    /// Target file size for level-1 (default: 16MB)
    pub target_file_size_base: u64,
    /// fsync after each write (default: true)
    pub sync_writes: bool,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/crossdb"),
            block_cache_size: 64 * 1024 * 1024,  // 64MB
            write_buffer_size: 16 * 1024 * 1024, // 16MB
            max_write_buffer_number: 3,
            target_file_size_base: 16 * 1024 * 1024, // 16MB
            sync_writes: true,
        }
    }
}

impl KvConfig {
    /// Create config for testing (smaller buffers, no sync)
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,  // 8MB
            write_buffer_size: 4 * 1024 * 1024, // 4MB
            max_write_buffer_number: 2,
            target_file_size_base: 4 * 1024 * 1024, // 4MB
            sync_writes: false,
        }
    }
}

/// Where and how stores are opened.
#[derive(Debug, Clone)]
pub struct StoreContext {
    /// Root directory for durable stores; `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    /// Records held in each store's cache.
    pub cache_size: usize,
    /// Engine tuning; `path` is replaced per store.
    pub kv: KvConfig,
}

impl Default for StoreContext {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl StoreContext {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            data_dir: None,
            cache_size: DEFAULT_CACHE_SIZE,
            kv: KvConfig::default(),
        }
    }

    #[must_use]
    pub fn with_data_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: Some(dir.as_ref().to_path_buf()),
            ..Self::in_memory()
        }
    }

    /// Path for store `name`, if stores are durable.
    #[must_use]
    pub fn resolve_path(&self, name: &str) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(name))
    }

    fn open_engine(&self, name: &str) -> Result<Arc<dyn KeyValueStore>, StoreError> {
        let Some(path) = self.resolve_path(name) else {
            return Ok(Arc::new(InMemoryKVStore::new()));
        };

        #[cfg(feature = "rocksdb")]
        {
            let config = KvConfig {
                path,
                ..self.kv.clone()
            };
            let engine = crate::adapters::RocksDbStore::open(config)
                .map_err(StoreError::storage("opening store"))?;
            Ok(Arc::new(engine))
        }

        #[cfg(not(feature = "rocksdb"))]
        {
            tracing::warn!(
                "[xc-02] Built without the rocksdb feature; store {} at {} kept in memory",
                name,
                path.display()
            );
            Ok(Arc::new(InMemoryKVStore::new()))
        }
    }
}

/// Open store `name` for `chain_id` and rebuild its indexes.
pub fn open_store(ctx: &StoreContext, chain_id: U256, name: &str) -> Result<RecordStore, StoreError> {
    let engine = ctx.open_engine(name)?;
    let store = RecordStore::new(chain_id, engine, ctx.cache_size);
    let indexed = store.load()?;
    info!(
        "[xc-02] Opened store {} for chain {} ({} records)",
        name, chain_id, indexed
    );
    Ok(store)
}
