//! # Query Filters
//!
//! Conjunctive field comparisons applied to records.

use super::record::{CrossTransactionWithSignatures, FieldName, IndexValue};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Gt => ordering == Ordering::Greater,
            Self::Gte => ordering != Ordering::Less,
            Self::Lt => ordering == Ordering::Less,
            Self::Lte => ordering != Ordering::Greater,
        }
    }
}

/// `field <op> value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filter {
    pub field: FieldName,
    pub op: Comparison,
    pub value: IndexValue,
}

impl Filter {
    pub fn new(field: FieldName, op: Comparison, value: impl Into<IndexValue>) -> Self {
        Self {
            field,
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: FieldName, value: impl Into<IndexValue>) -> Self {
        Self::new(field, Comparison::Eq, value)
    }

    pub fn gt(field: FieldName, value: impl Into<IndexValue>) -> Self {
        Self::new(field, Comparison::Gt, value)
    }

    pub fn gte(field: FieldName, value: impl Into<IndexValue>) -> Self {
        Self::new(field, Comparison::Gte, value)
    }

    pub fn lt(field: FieldName, value: impl Into<IndexValue>) -> Self {
        Self::new(field, Comparison::Lt, value)
    }

    pub fn lte(field: FieldName, value: impl Into<IndexValue>) -> Self {
        Self::new(field, Comparison::Lte, value)
    }

    /// Whether `record` satisfies the comparison. A value of the wrong kind
    /// for the field never matches.
    #[must_use]
    pub fn matches(&self, record: &CrossTransactionWithSignatures) -> bool {
        self.field
            .value_of(record)
            .compare(&self.value)
            .is_some_and(|ordering| self.op.accepts(ordering))
    }

    /// The index key value for an equality filter on an indexed field.
    pub(crate) fn index_point(&self) -> Option<IndexValue> {
        if self.op != Comparison::Eq || !self.field.is_indexed() {
            return None;
        }
        self.value.for_field(self.field)
    }
}

/// Whether `record` satisfies every filter.
#[must_use]
pub fn matches_all(filters: &[Filter], record: &CrossTransactionWithSignatures) -> bool {
    filters.iter().all(|f| f.matches(record))
}
