//! Node, relationship, and property-set data model (spec.md §3).

use crate::ids::{DictCode, NodeId, RelId, Xid};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version header shared by nodes and relationships. A version is visible
/// to `xid` iff `xmin <= xid < xmax` and the writer committed before this
/// snapshot, or `xid` is itself the writer ("see own writes").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionHeader {
    /// Transaction that currently owns (has locked) this version, if any.
    pub owner: Option<Xid>,
    /// First transaction this version is visible to.
    pub xmin: Xid,
    /// First transaction this version is no longer visible to, if retired.
    pub xmax: Option<Xid>,
    /// Pointer to an uncommitted successor version written by `owner`.
    pub dirty: Option<DirtyVersion>,
}

impl VersionHeader {
    pub fn new(xmin: Xid) -> Self {
        Self {
            owner: None,
            xmin,
            xmax: None,
            dirty: None,
        }
    }
}

/// An uncommitted edit to a node/relationship, visible only to the writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirtyVersion {
    pub writer: Xid,
    pub label: Option<DictCode>,
    pub detached: bool,
}

/// A node (vertex). Adjacency pointers are `None` (no outgoing/incoming
/// relationship) rather than the `UNKNOWN` sentinel the wire encoding uses
/// internally (spec.md §9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: DictCode,
    pub first_outgoing: Option<RelId>,
    pub first_incoming: Option<RelId>,
    pub first_property_set: Option<u64>,
    pub version: VersionHeader,
}

impl Node {
    pub fn new(id: NodeId, label: DictCode, xmin: Xid) -> Self {
        Self {
            id,
            label,
            first_outgoing: None,
            first_incoming: None,
            first_property_set: None,
            version: VersionHeader::new(xmin),
        }
    }
}

/// A relationship (edge). Invariant: a relationship appears exactly once in
/// `next_out_of_src`'s chain from `src.first_outgoing`, and exactly once in
/// `next_in_of_dst`'s chain from `dst.first_incoming`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelId,
    pub label: DictCode,
    pub src: NodeId,
    pub dst: NodeId,
    pub next_out_of_src: Option<RelId>,
    pub next_in_of_dst: Option<RelId>,
    pub first_property_set: Option<u64>,
    pub version: VersionHeader,
}

impl Relationship {
    pub fn new(id: RelId, label: DictCode, src: NodeId, dst: NodeId, xmin: Xid) -> Self {
        Self {
            id,
            label,
            src,
            dst,
            next_out_of_src: None,
            next_in_of_dst: None,
            first_property_set: None,
            version: VersionHeader::new(xmin),
        }
    }
}

/// Number of `(key, value)` items held per property bucket before chaining
/// to a new bucket. Spec.md §6 default.
pub const PROPERTY_BUCKET_SIZE: usize = 3;

/// A scalar property value. A superset of the tuple cell's scalar variants
/// (`graphdb_core::tuple::Cell`), reused by both the property chain and
/// tuple cells so the filter evaluator and projection operator share one
/// coercion path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Null,
    Int(i64),
    Double(f64),
    UInt(u64),
    Bool(bool),
    /// Interned string property value (spec.md §2).
    String(DictCode),
    DateTime(DateTime<Utc>),
}

impl PropertyValue {
    pub fn type_tag(&self) -> &'static str {
        match self {
            PropertyValue::Null => "null",
            PropertyValue::Int(_) => "int",
            PropertyValue::Double(_) => "double",
            PropertyValue::UInt(_) => "uint",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::String(_) => "string",
            PropertyValue::DateTime(_) => "datetime",
        }
    }
}

/// A single `(key-code, value)` slot within a property bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyItem {
    pub key: DictCode,
    pub value: PropertyValue,
}

/// One bucket in a property-set chain. Key uniqueness holds within the
/// whole chain belonging to one owner, not within a single bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyBucket {
    pub owner: u64,
    pub items: Vec<PropertyItem>,
    pub next_bucket: Option<u64>,
}

impl PropertyBucket {
    pub fn new(owner: u64) -> Self {
        Self {
            owner,
            items: Vec::with_capacity(PROPERTY_BUCKET_SIZE),
            next_bucket: None,
        }
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= PROPERTY_BUCKET_SIZE
    }

    /// Linear scan within this bucket for `key`, per spec.md §4.5.
    pub fn find(&self, key: DictCode) -> Option<&PropertyValue> {
        self.items
            .iter()
            .find(|item| item.key == key)
            .map(|item| &item.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_linear_scan_finds_key() {
        let mut bucket = PropertyBucket::new(1);
        bucket.items.push(PropertyItem {
            key: DictCode(5),
            value: PropertyValue::Int(42),
        });
        assert_eq!(bucket.find(DictCode(5)), Some(&PropertyValue::Int(42)));
        assert_eq!(bucket.find(DictCode(6)), None);
    }

    #[test]
    fn bucket_fills_at_default_size() {
        let mut bucket = PropertyBucket::new(1);
        for i in 0..PROPERTY_BUCKET_SIZE {
            bucket.items.push(PropertyItem {
                key: DictCode(i as u32),
                value: PropertyValue::Null,
            });
            assert_eq!(bucket.is_full(), i + 1 == PROPERTY_BUCKET_SIZE);
        }
    }
}
