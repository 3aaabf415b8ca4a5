//! # Key Layout
//!
//! Primary records under `r:` ‖ id; index entries under
//! `i:` ‖ tag ‖ value ‖ id with an empty value.

use super::record::{CrossTransactionWithSignatures, FieldName, IndexValue};
use shared_types::{Hash, HASH_LENGTH};

pub const PRIMARY_PREFIX: &[u8] = b"r:";
pub const INDEX_PREFIX: &[u8] = b"i:";

#[must_use]
pub fn primary_key(id: &Hash) -> Vec<u8> {
    [PRIMARY_PREFIX, id.as_slice()].concat()
}

/// Id of a primary key, `None` if the key is not one.
#[must_use]
pub fn id_from_primary_key(key: &[u8]) -> Option<Hash> {
    let rest = key.strip_prefix(PRIMARY_PREFIX)?;
    rest.try_into().ok()
}

/// Prefix of every index entry of `field`.
#[must_use]
pub fn index_prefix(field: FieldName) -> Vec<u8> {
    [INDEX_PREFIX, &[field.tag()][..]].concat()
}

/// Prefix of every index entry of `field` equal to `value`.
#[must_use]
pub fn index_value_prefix(field: FieldName, value: &IndexValue) -> Vec<u8> {
    [index_prefix(field), value.encode()].concat()
}

#[must_use]
pub fn index_key(field: FieldName, value: &IndexValue, id: &Hash) -> Vec<u8> {
    [index_value_prefix(field, value), id.to_vec()].concat()
}

/// Record id at the tail of an index key.
#[must_use]
pub fn id_from_index_key(key: &[u8]) -> Option<Hash> {
    let start = key.len().checked_sub(HASH_LENGTH)?;
    key.get(start..)?.try_into().ok()
}

/// Every index key a record should have.
#[must_use]
pub fn index_keys(record: &CrossTransactionWithSignatures) -> Vec<Vec<u8>> {
    let id = record.id();
    FieldName::INDEXED
        .iter()
        .map(|field| index_key(*field, &field.value_of(record), &id))
        .collect()
}

/// Smallest key greater than every key starting with `prefix`.
#[must_use]
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}
