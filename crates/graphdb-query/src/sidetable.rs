//! Join side-tables (spec.md §4.4), grounded on
//! `examples/original_source/src/query/codegen/proc/joiner.hpp`'s
//! `cross_joiner`/`nested_loop_joiner`/hash-bucket joiner shapes. All are
//! write-once from a right pipeline's `EndPipeline` and read-many by the
//! left pipeline; writes are serialized by a per-table lock (or, for the
//! hash table, a per-bucket lock), reads only happen once the right
//! pipeline has closed.

use graphdb_core::Tuple;
use parking_lot::Mutex;

/// Unifies `CrossSideTable`/`NestedLoopSideTable`/`HashSideTable` so
/// `EndPipeline` can materialize into any of them without matching on the
/// binary-operator kind.
pub trait SideTable: Send + Sync {
    fn insert(&self, tuple: Tuple);
    fn len(&self) -> usize;
    /// Every materialized tuple, for joins that scan the whole right side
    /// (cross join, nested-loop join).
    fn all(&self) -> Vec<Tuple>;
    /// The tuples in `key`'s hash bucket; the default falls back to `all()`
    /// so cross/nested-loop side-tables can share the join dispatch code
    /// with the hash side-table.
    fn probe(&self, key: u64) -> Vec<Tuple> {
        let _ = key;
        self.all()
    }
}

#[derive(Debug, Default)]
pub struct CrossSideTable {
    rows: Mutex<Vec<Tuple>>,
}

impl CrossSideTable {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SideTable for CrossSideTable {
    fn insert(&self, tuple: Tuple) {
        self.rows.lock().push(tuple);
    }
    fn len(&self) -> usize {
        self.rows.lock().len()
    }
    fn all(&self) -> Vec<Tuple> {
        self.rows.lock().clone()
    }
}

#[derive(Debug, Default)]
pub struct NestedLoopSideTable {
    rows: Mutex<Vec<Tuple>>,
}

impl NestedLoopSideTable {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SideTable for NestedLoopSideTable {
    fn insert(&self, tuple: Tuple) {
        self.rows.lock().push(tuple);
    }
    fn len(&self) -> usize {
        self.rows.lock().len()
    }
    fn all(&self) -> Vec<Tuple> {
        self.rows.lock().clone()
    }
}

/// Bucketed by `hash(key) = key % buckets` (spec.md §4.4); the table is
/// built once so no rehashing is needed. Design choice: linear chaining by
/// vector per bucket.
pub struct HashSideTable {
    buckets: Vec<Mutex<Vec<Tuple>>>,
    /// Position in the right tuple whose `entity_key()` is hashed on insert.
    key_pos: usize,
}

impl HashSideTable {
    pub fn new(bucket_count: usize, key_pos: usize) -> Self {
        let bucket_count = bucket_count.max(1);
        Self {
            buckets: (0..bucket_count).map(|_| Mutex::new(Vec::new())).collect(),
            key_pos,
        }
    }

    fn bucket_index(&self, key: u64) -> usize {
        (key % self.buckets.len() as u64) as usize
    }
}

impl SideTable for HashSideTable {
    fn insert(&self, tuple: Tuple) {
        if let Some(key) = tuple.get(self.key_pos).and_then(|c| c.entity_key()) {
            let idx = self.bucket_index(key);
            self.buckets[idx].lock().push(tuple);
        }
    }

    fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.lock().len()).sum()
    }

    fn all(&self) -> Vec<Tuple> {
        self.buckets.iter().flat_map(|b| b.lock().clone()).collect()
    }

    fn probe(&self, key: u64) -> Vec<Tuple> {
        self.buckets[self.bucket_index(key)].lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphdb_core::{Cell, NodeId};

    #[test]
    fn cross_side_table_accumulates_every_insert() {
        let t = CrossSideTable::new();
        t.insert(vec![Cell::Int(1)]);
        t.insert(vec![Cell::Int(2)]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.all().len(), 2);
    }

    #[test]
    fn hash_side_table_probes_only_its_bucket() {
        let t = HashSideTable::new(4, 0);
        t.insert(vec![Cell::Node(NodeId::new(1))]);
        t.insert(vec![Cell::Node(NodeId::new(5))]);
        t.insert(vec![Cell::Node(NodeId::new(2))]);
        assert_eq!(t.len(), 3);
        let bucket1 = t.probe(1);
        assert_eq!(bucket1.len(), 2);
        let bucket2 = t.probe(2);
        assert_eq!(bucket2.len(), 1);
    }
}
