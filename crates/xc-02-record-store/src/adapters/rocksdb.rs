//! # RocksDB Engine
//!
//! Durable `KeyValueStore` over a single RocksDB instance per record store.
//!
//! - Atomic batch writes (WriteBatch)
//! - Snappy compression
//! - Bloom filters for point reads
//! - Optional fsync per write

use crate::domain::KVStoreError;
use crate::open::KvConfig;
use crate::ports::{BatchOperation, KeyValueStore};
use rocksdb::{
    BlockBasedOptions, Cache, DBCompressionType, Direction, ErrorKind, IteratorMode, Options, WriteBatch,
    WriteOptions, DB,
};
use std::fmt::Display;
use tracing::info;

pub struct RocksDbStore {
    db: DB,
    config: KvConfig,
}

fn engine_error(action: &str, kind: ErrorKind, detail: impl Display) -> KVStoreError {
    let message = format!("RocksDB {} failed: {}", action, detail);
    match kind {
        ErrorKind::Corruption => KVStoreError::CorruptionError { message },
        _ => KVStoreError::IOError { message },
    }
}

fn io_error(action: &str) -> impl FnOnce(rocksdb::Error) -> KVStoreError + '_ {
    move |e| engine_error(action, e.kind(), &e)
}

impl RocksDbStore {
    /// Open or create a database at `config.path`.
    pub fn open(config: KvConfig) -> Result<Self, KVStoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        // Performance tuning
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);
        opts.set_target_file_size_base(config.target_file_size_base);
        opts.set_compression_type(DBCompressionType::Snappy);

        let mut block_opts = BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let db = DB::open(&opts, &config.path).map_err(io_error("open"))?;
        info!("[xc-02] Opened RocksDB at {}", config.path.display());

        Ok(Self { db, config })
    }

    fn write_options(&self) -> WriteOptions {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        write_opts
    }

    fn scan(
        &self,
        from: &[u8],
        keep: impl Fn(&[u8]) -> bool,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        let mut results = Vec::new();
        for item in self.db.iterator(IteratorMode::From(from, Direction::Forward)) {
            let (key, value) = item.map_err(io_error("scan"))?;
            if !keep(&key) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }
        Ok(results)
    }
}

impl KeyValueStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.db.get(key).map_err(io_error("get"))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.db
            .put_opt(key, value, &self.write_options())
            .map_err(io_error("put"))
    }

    fn delete(&self, key: &[u8]) -> Result<(), KVStoreError> {
        self.db
            .delete_opt(key, &self.write_options())
            .map_err(io_error("delete"))
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let mut batch = WriteBatch::default();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => batch.put(&key, &value),
                BatchOperation::Delete { key } => batch.delete(&key),
            }
        }
        self.db
            .write_opt(batch, &self.write_options())
            .map_err(io_error("batch write"))
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        self.db
            .get_pinned(key)
            .map(|v| v.is_some())
            .map_err(io_error("exists check"))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        self.scan(prefix, |key| key.starts_with(prefix))
    }

    fn count_prefix(&self, prefix: &[u8]) -> Result<usize, KVStoreError> {
        let mut iter = self.db.raw_iterator();
        iter.seek(prefix);
        let mut count = 0;
        while iter.key().is_some_and(|key| key.starts_with(prefix)) {
            count += 1;
            iter.next();
        }
        iter.status().map_err(io_error("count"))?;
        Ok(count)
    }

    fn range_scan(
        &self,
        from: &[u8],
        to: Option<&[u8]>,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        self.scan(from, |key| to.map_or(true, |to| key < to))
    }
}
