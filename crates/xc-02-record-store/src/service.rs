//! # Record Store Service
//!
//! Cross-transaction records for one chain over a `KeyValueStore`, with
//! secondary indexes on every non-key field and an LRU cache in front.
//!
//! ## Concurrency
//!
//! Mutations of one id (`write`, `update`, `delete`) and cache fills for it
//! run under a per-id lock; different ids never contend. Reads that hit the
//! cache take no id lock. `load` and `repair` are startup operations and
//! must not race with writers.

use crate::domain::keys::{
    id_from_index_key, id_from_primary_key, index_keys, index_prefix, index_value_prefix,
    prefix_end, primary_key, INDEX_PREFIX, PRIMARY_PREFIX,
};
use crate::domain::{
    matches_all, CrossTransactionWithSignatures, FieldName, Filter, IndexValue, RepairReport,
    StoreError,
};
use crate::ports::{BatchOperation, KeyValueStore};
use lru::LruCache;
use parking_lot::Mutex;
use shared_types::{short_hex, Hash, U256};
use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

/// Records cached per store by default.
pub const DEFAULT_CACHE_SIZE: usize = 1024;

type Record = CrossTransactionWithSignatures;

/// Indexed cross-transaction records of one chain.
pub struct RecordStore {
    chain_id: U256,
    kv: Arc<dyn KeyValueStore>,
    /// Write-through; `None` when the cache size is zero.
    cache: Option<Mutex<LruCache<Hash, Record>>>,
    locks: Mutex<HashMap<Hash, Arc<Mutex<()>>>>,
}

impl RecordStore {
    pub fn new(chain_id: U256, kv: Arc<dyn KeyValueStore>, cache_size: usize) -> Self {
        Self {
            chain_id,
            kv,
            cache: NonZeroUsize::new(cache_size).map(|cap| Mutex::new(LruCache::new(cap))),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// A store on a fresh in-memory engine.
    pub fn in_memory(chain_id: U256) -> Self {
        Self::new(
            chain_id,
            Arc::new(crate::adapters::InMemoryKVStore::new()),
            DEFAULT_CACHE_SIZE,
        )
    }

    /// Chain whose records this store holds.
    #[must_use]
    pub fn chain_id(&self) -> U256 {
        self.chain_id
    }

    // =========================================================================
    // CODEC, CACHE, LOCKS
    // =========================================================================

    fn encode(record: &Record) -> Result<Vec<u8>, StoreError> {
        bincode::serialize(record).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<Record, StoreError> {
        bincode::deserialize(bytes).map_err(|e| StoreError::Corrupted(e.to_string()))
    }

    fn cache_get(&self, id: &Hash) -> Option<Record> {
        self.cache.as_ref()?.lock().get(id).cloned()
    }

    fn cache_put(&self, record: &Record) {
        if let Some(cache) = &self.cache {
            cache.lock().put(record.id(), record.clone());
        }
    }

    fn cache_pop(&self, id: &Hash) {
        if let Some(cache) = &self.cache {
            cache.lock().pop(id);
        }
    }

    fn cache_clear(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().clear();
        }
    }

    /// Run `f` holding the lock for `id`, then drop the lock entry if no one
    /// else is waiting on it.
    fn with_id_lock<T>(
        &self,
        id: &Hash,
        f: impl FnOnce() -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let lock = self.locks.lock().entry(*id).or_default().clone();
        let result = {
            let _guard = lock.lock();
            f()
        };
        let mut locks = self.locks.lock();
        // Map entry plus our clone
        if Arc::strong_count(&lock) == 2 {
            locks.remove(id);
        }
        result
    }

    /// Cache, then engine. Does not fill the cache.
    fn fetch(&self, id: &Hash) -> Result<Option<Record>, StoreError> {
        if let Some(record) = self.cache_get(id) {
            return Ok(Some(record));
        }
        self.kv
            .get(&primary_key(id))
            .map_err(StoreError::storage("reading record"))?
            .map(|bytes| Self::decode(&bytes))
            .transpose()
    }

    // =========================================================================
    // POINT OPERATIONS
    // =========================================================================

    /// Insert `record` unless its id is already stored.
    pub fn write(&self, record: &Record) -> Result<(), StoreError> {
        let id = record.id();
        self.with_id_lock(&id, || {
            let key = primary_key(&id);
            if self
                .kv
                .exists(&key)
                .map_err(StoreError::storage("checking record"))?
            {
                trace!("[xc-02] Record {} already stored", short_hex(&id));
                return Ok(());
            }

            let mut ops = vec![BatchOperation::put(key, Self::encode(record)?)];
            ops.extend(
                index_keys(record)
                    .into_iter()
                    .map(|k| BatchOperation::put(k, Vec::<u8>::new())),
            );
            self.kv
                .atomic_batch_write(ops)
                .map_err(StoreError::storage("writing record"))?;

            self.cache_put(record);
            debug!(
                "[xc-02] Stored record {} (chain {}, block {})",
                short_hex(&id),
                self.chain_id,
                record.block_num
            );
            Ok(())
        })
    }

    pub fn has(&self, id: &Hash) -> Result<bool, StoreError> {
        if self.cache_get(id).is_some() {
            return Ok(true);
        }
        self.kv
            .exists(&primary_key(id))
            .map_err(StoreError::storage("checking record"))
    }

    /// The record with `id`, or `NotFound`.
    pub fn read(&self, id: &Hash) -> Result<Record, StoreError> {
        if let Some(record) = self.cache_get(id) {
            return Ok(record);
        }
        self.with_id_lock(id, || {
            let record = self.fetch(id)?.ok_or(StoreError::NotFound(*id))?;
            self.cache_put(&record);
            Ok(record)
        })
    }

    /// First record whose `field` equals `key`, lowest id first.
    pub fn one(
        &self,
        field: FieldName,
        key: impl Into<IndexValue>,
    ) -> Result<Option<Record>, StoreError> {
        let key = key.into();
        if field == FieldName::CtxId {
            let IndexValue::Id(id) = key else {
                return Ok(None);
            };
            return match self.read(&id) {
                Ok(record) => Ok(Some(record)),
                Err(StoreError::NotFound(_)) => Ok(None),
                Err(e) => Err(e),
            };
        }

        let Some(point) = key.for_field(field) else {
            return Ok(None);
        };
        let entries = self
            .kv
            .prefix_scan(&index_value_prefix(field, &point))
            .map_err(StoreError::storage("scanning index"))?;
        for (index_key, _) in entries {
            let Some(id) = id_from_index_key(&index_key) else {
                continue;
            };
            match self.read(&id) {
                Ok(record) => return Ok(Some(record)),
                Err(StoreError::NotFound(_)) => {
                    debug!("[xc-02] Dangling {:?} index entry for {}", field, short_hex(&id));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    /// Atomically read, patch and store the record with `id`.
    ///
    /// `patch` runs under the id's lock. Index entries of changed fields are
    /// moved in the same batch as the record. Returns the stored record.
    pub fn update<F>(&self, id: &Hash, patch: F) -> Result<Record, StoreError>
    where
        F: FnOnce(&mut Record),
    {
        self.with_id_lock(id, || {
            let current = self.fetch(id)?.ok_or(StoreError::NotFound(*id))?;
            let mut next = current.clone();
            patch(&mut next);

            if next.id() != *id {
                return Err(StoreError::IdentityChanged(*id));
            }
            if next == current {
                return Ok(next);
            }

            let old_keys = index_keys(&current);
            let new_keys = index_keys(&next);
            let mut ops: Vec<BatchOperation> = old_keys
                .iter()
                .filter(|k| !new_keys.contains(k))
                .map(|k| BatchOperation::delete(k.clone()))
                .collect();
            ops.extend(
                new_keys
                    .iter()
                    .filter(|k| !old_keys.contains(k))
                    .map(|k| BatchOperation::put(k.clone(), Vec::<u8>::new())),
            );
            ops.push(BatchOperation::put(primary_key(id), Self::encode(&next)?));

            self.kv
                .atomic_batch_write(ops)
                .map_err(StoreError::storage("updating record"))?;
            self.cache_pop(id);

            debug!(
                "[xc-02] Updated record {}: status {} -> {}, block {} -> {}",
                short_hex(id),
                current.status,
                next.status,
                current.block_num,
                next.block_num
            );
            Ok(next)
        })
    }

    /// Remove the record and its index entries. Returns whether it existed.
    pub fn delete(&self, id: &Hash) -> Result<bool, StoreError> {
        self.with_id_lock(id, || {
            let Some(current) = self.fetch(id)? else {
                return Ok(false);
            };

            let mut ops = vec![BatchOperation::delete(primary_key(id))];
            ops.extend(index_keys(&current).into_iter().map(BatchOperation::delete));
            self.kv
                .atomic_batch_write(ops)
                .map_err(StoreError::storage("deleting record"))?;
            self.cache_pop(id);

            debug!("[xc-02] Deleted record {}", short_hex(id));
            Ok(true)
        })
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Visit records in `order_by` order (ties by id) until `visit` returns
    /// `false`. An equality filter on `order_by` narrows the scan.
    fn scan_ordered(
        &self,
        order_by: FieldName,
        filters: &[Filter],
        mut visit: impl FnMut(Record) -> bool,
    ) -> Result<(), StoreError> {
        if order_by == FieldName::CtxId {
            let entries = self
                .kv
                .prefix_scan(PRIMARY_PREFIX)
                .map_err(StoreError::storage("scanning records"))?;
            for (_, value) in entries {
                if !visit(Self::decode(&value)?) {
                    break;
                }
            }
            return Ok(());
        }

        let prefix = filters
            .iter()
            .filter(|f| f.field == order_by)
            .find_map(Filter::index_point)
            .map_or_else(
                || index_prefix(order_by),
                |point| index_value_prefix(order_by, &point),
            );
        let entries = self
            .kv
            .prefix_scan(&prefix)
            .map_err(StoreError::storage("scanning index"))?;

        for (key, _) in entries {
            let Some(id) = id_from_index_key(&key) else {
                continue;
            };
            let Some(record) = self.fetch(&id)? else {
                debug!("[xc-02] Dangling {:?} index entry for {}", order_by, short_hex(&id));
                continue;
            };
            if !visit(record) {
                break;
            }
        }
        Ok(())
    }

    /// One page of records matching every filter, ascending by `order_by`
    /// with ties broken by id.
    ///
    /// Pages are 1-based. `page_size == 0` returns every match; a non-zero
    /// page size with `start_page == 0` returns nothing.
    pub fn query(
        &self,
        page_size: usize,
        start_page: usize,
        order_by: FieldName,
        filters: &[Filter],
    ) -> Result<Vec<Record>, StoreError> {
        if page_size > 0 && start_page == 0 {
            return Ok(Vec::new());
        }
        let skip = if page_size == 0 {
            0
        } else {
            (start_page - 1).saturating_mul(page_size)
        };

        let mut skipped = 0;
        let mut page = Vec::new();
        self.scan_ordered(order_by, filters, |record| {
            if !matches_all(filters, &record) {
                return true;
            }
            if skipped < skip {
                skipped += 1;
                return true;
            }
            page.push(record);
            page_size == 0 || page.len() < page_size
        })?;
        Ok(page)
    }

    /// Records with `begin <= block_num <= end`, ascending. `page_size == 0`
    /// means no limit.
    pub fn range_by_number(
        &self,
        begin: u64,
        end: u64,
        page_size: usize,
    ) -> Result<Vec<Record>, StoreError> {
        if begin > end {
            return Ok(Vec::new());
        }
        let from = index_value_prefix(FieldName::BlockNum, &IndexValue::Number(begin));
        let to = match end.checked_add(1) {
            Some(next) => Some(index_value_prefix(FieldName::BlockNum, &IndexValue::Number(next))),
            None => prefix_end(&index_prefix(FieldName::BlockNum)),
        };
        let entries = self
            .kv
            .range_scan(&from, to.as_deref())
            .map_err(StoreError::storage("scanning block range"))?;

        let mut records = Vec::new();
        for (key, _) in entries {
            let Some(id) = id_from_index_key(&key) else {
                continue;
            };
            if let Some(record) = self.fetch(&id)? {
                records.push(record);
                if page_size > 0 && records.len() >= page_size {
                    break;
                }
            }
        }
        Ok(records)
    }

    /// Number of records matching every filter.
    ///
    /// No filters, or a single equality filter on an indexed field, are
    /// answered from keys alone; anything else decodes the narrowed scan.
    pub fn count(&self, filters: &[Filter]) -> Result<usize, StoreError> {
        match filters {
            [] => return self.len(),
            [only] => {
                if let Some(point) = only.index_point() {
                    return self
                        .kv
                        .count_prefix(&index_value_prefix(only.field, &point))
                        .map_err(StoreError::storage("counting index entries"));
                }
            }
            _ => {}
        }
        let narrow = filters
            .iter()
            .find(|f| f.index_point().is_some())
            .map_or(FieldName::CtxId, |f| f.field);

        let mut count = 0;
        self.scan_ordered(narrow, filters, |record| {
            if matches_all(filters, &record) {
                count += 1;
            }
            true
        })?;
        Ok(count)
    }

    /// Number of stored records.
    pub fn len(&self) -> Result<usize, StoreError> {
        self.kv
            .count_prefix(PRIMARY_PREFIX)
            .map_err(StoreError::storage("counting records"))
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        self.len().map(|n| n == 0)
    }

    /// Highest block number of any stored record, 0 when empty.
    pub fn height(&self) -> Result<u64, StoreError> {
        let prefix = index_prefix(FieldName::BlockNum);
        let entries = self
            .kv
            .prefix_scan(&prefix)
            .map_err(StoreError::storage("scanning block index"))?;
        Ok(entries
            .last()
            .and_then(|(key, _)| key.get(prefix.len()..prefix.len() + 8))
            .and_then(|bytes| bytes.try_into().ok())
            .map_or(0, u64::from_be_bytes))
    }

    // =========================================================================
    // STARTUP: LOAD / REPAIR
    // =========================================================================

    /// Rebuild every index entry from the primary records in one atomic
    /// batch. Undecodable records are skipped. Returns records indexed.
    pub fn load(&self) -> Result<usize, StoreError> {
        let mut ops: Vec<BatchOperation> = self
            .kv
            .prefix_scan(INDEX_PREFIX)
            .map_err(StoreError::storage("scanning indexes"))?
            .into_iter()
            .map(|(key, _)| BatchOperation::delete(key))
            .collect();

        let mut indexed = 0;
        let records = self
            .kv
            .prefix_scan(PRIMARY_PREFIX)
            .map_err(StoreError::storage("scanning records"))?;
        for (key, value) in records {
            match Self::decode(&value) {
                Ok(record) => {
                    ops.extend(
                        index_keys(&record)
                            .into_iter()
                            .map(|k| BatchOperation::put(k, Vec::<u8>::new())),
                    );
                    indexed += 1;
                }
                Err(e) => warn!("[xc-02] Skipping undecodable record {}: {}", hex::encode(&key), e),
            }
        }

        self.kv
            .atomic_batch_write(ops)
            .map_err(StoreError::storage("rebuilding indexes"))?;
        self.cache_clear();

        debug!("[xc-02] Indexes rebuilt for {} records", indexed);
        Ok(indexed)
    }

    /// Check indexes against primary records and fix the difference:
    /// missing entries are added, dangling or stale ones removed, and
    /// undecodable records dropped.
    pub fn repair(&self) -> Result<RepairReport, StoreError> {
        let started = Instant::now();
        let mut report = RepairReport::new();
        let mut ops = Vec::new();
        let mut expected = BTreeSet::new();

        let records = self
            .kv
            .prefix_scan(PRIMARY_PREFIX)
            .map_err(StoreError::storage("scanning records"))?;
        for (key, value) in records {
            match Self::decode(&value) {
                Ok(record) if id_from_primary_key(&key) == Some(record.id()) => {
                    expected.extend(index_keys(&record));
                    report.add_record(record.block_num);
                }
                _ => {
                    report.corrupt_removed.push(hex::encode(&key));
                    ops.push(BatchOperation::delete(key));
                }
            }
        }

        let actual: BTreeSet<Vec<u8>> = self
            .kv
            .prefix_scan(INDEX_PREFIX)
            .map_err(StoreError::storage("scanning indexes"))?
            .into_iter()
            .map(|(key, _)| key)
            .collect();

        for stale in actual.difference(&expected) {
            ops.push(BatchOperation::delete(stale.clone()));
            report.indexes_removed += 1;
        }
        for missing in expected.difference(&actual) {
            ops.push(BatchOperation::put(missing.clone(), Vec::<u8>::new()));
            report.indexes_added += 1;
        }

        if !ops.is_empty() {
            self.kv
                .atomic_batch_write(ops)
                .map_err(StoreError::storage("repairing indexes"))?;
        }
        self.cache_clear();
        report.duration_ms = started.elapsed().as_millis() as u64;

        if report.is_clean() {
            info!(
                "[xc-02] Repair found {} records, indexes consistent",
                report.records_scanned
            );
        } else {
            warn!(
                "[xc-02] Repair: {} records, {} index entries added, {} removed, {} corrupt records dropped",
                report.records_scanned,
                report.indexes_added,
                report.indexes_removed,
                report.corrupt_removed.len()
            );
        }
        Ok(report)
    }
}
