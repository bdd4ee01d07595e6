//! External interfaces the query engine consumes (spec.md §6): `GraphStore`
//! and `TransactionManager`. Both are object-safe, synchronous traits —
//! the engine's concurrency model is thread-parallel, not async.

use crate::error::Result;
use crate::ids::{DictCode, NodeId, RelId, Xid};
use crate::model::{PropertyValue, VersionHeader};
use std::collections::HashMap;
use std::ops::Range;

/// A flattened `{id, label, properties}` view of a node or relationship,
/// used by DML operators and by Yen's algorithm when it deletes and later
/// restores a relationship with the same endpoints, label, and properties.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDescription {
    pub id: NodeId,
    pub label: DictCode,
    pub properties: HashMap<DictCode, PropertyValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipDescription {
    pub id: RelId,
    pub label: DictCode,
    pub from_id: NodeId,
    pub to_id: NodeId,
    pub properties: HashMap<DictCode, PropertyValue>,
}

/// Opaque handle to a secondary index on `(label, property)`, returned by
/// `GraphStore::get_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexHandle(pub u64);

/// Whether a newly created entity should be marked as part of the current
/// transaction's dirty-write set (`txn_flag` in spec.md §6) or committed
/// immediately (used by restoration inside Yen's algorithm, which recreates
/// a relationship outside the caller's own transaction bookkeeping).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnFlag {
    Dirty,
    Committed,
}

/// Storage and indexing surface the query engine consumes. Implemented by
/// `graphdb-txn`'s in-memory engine; kept minimal to exactly the operations
/// spec.md §6 lists (plus the direction-generic adjacency visitor the
/// operator algebra needs — see `graphdb-analytics`).
pub trait GraphStore: Send + Sync {
    /// Total capacity of the node vector, for chunked-range scan planning.
    fn node_count(&self) -> usize;
    fn relationship_count(&self) -> usize;

    /// Chunked-range iteration over the node vector: `chunk_range(k, n)`
    /// returns the half-open `[first, last)` offset range for chunk `k` of
    /// `n` total chunks.
    fn node_chunk_range(&self, chunk: usize, chunks: usize) -> Range<u64>;

    fn node_by_id(&self, id: NodeId) -> Result<crate::model::Node>;
    fn rship_by_id(&self, id: RelId) -> Result<crate::model::Relationship>;

    /// Returns the node version visible to `xid` (spec.md §6).
    fn get_valid_node_version(&self, node: NodeId, xid: Xid) -> Result<crate::model::Node>;
    fn get_valid_rship_version(
        &self,
        rship: RelId,
        xid: Xid,
    ) -> Result<crate::model::Relationship>;

    fn get_code(&self, s: &str) -> DictCode;
    fn get_string(&self, code: DictCode) -> Option<String>;

    fn get_node_description(&self, id: NodeId) -> Result<NodeDescription>;
    fn get_rship_description(&self, id: RelId) -> Result<RelationshipDescription>;

    fn add_node(
        &self,
        label: DictCode,
        properties: HashMap<DictCode, PropertyValue>,
        txn_flag: TxnFlag,
        xid: Xid,
    ) -> Result<NodeId>;

    fn add_relationship(
        &self,
        src: NodeId,
        dst: NodeId,
        label: DictCode,
        properties: HashMap<DictCode, PropertyValue>,
        txn_flag: TxnFlag,
        xid: Xid,
    ) -> Result<RelId>;

    fn update_node(
        &self,
        id: NodeId,
        properties: HashMap<DictCode, PropertyValue>,
        xid: Xid,
    ) -> Result<()>;

    /// Logically detaches a node: deletes every incident relationship so
    /// the node can later be removed. A node is never deleted directly
    /// (spec.md §3).
    fn detach_node(&self, id: NodeId, xid: Xid) -> Result<()>;
    fn remove_node(&self, id: NodeId, xid: Xid) -> Result<()>;
    fn delete_relationship(&self, id: RelId) -> Result<()>;
    fn delete_relationship_txn(&self, id: RelId, xid: Xid) -> Result<()>;

    fn get_index(&self, label: DictCode, property: DictCode) -> Option<IndexHandle>;
    fn index_lookup(&self, idx: IndexHandle, value: &PropertyValue) -> Vec<NodeId>;

    /// Visits every relationship outgoing from `n` that is visible to
    /// `xid`, honoring dirty-version preference per spec.md §4.1.
    fn foreach_from_relationship_of_node(
        &self,
        n: NodeId,
        xid: Xid,
        visit: &mut dyn FnMut(&crate::model::Relationship),
    ) -> Result<()>;

    fn foreach_to_relationship_of_node(
        &self,
        n: NodeId,
        xid: Xid,
        visit: &mut dyn FnMut(&crate::model::Relationship),
    ) -> Result<()>;
}

/// Transaction lifecycle and per-version visibility checks (spec.md §6).
/// The four visibility predicates take a version header reference rather
/// than a whole node/relationship, so one check serves both entity kinds.
pub trait TransactionManager: Send + Sync {
    fn begin(&self) -> Xid;
    fn commit(&self, xid: Xid) -> Result<()>;
    fn abort(&self, xid: Xid);

    fn is_locked_by(&self, version: &VersionHeader, xid: Xid) -> bool;
    fn has_dirty_versions(&self, version: &VersionHeader) -> bool;
    fn has_valid_version(&self, version: &VersionHeader, xid: Xid) -> bool;
    fn is_valid_for(&self, version: &VersionHeader, xid: Xid) -> bool;
}
