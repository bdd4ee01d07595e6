//! Tuple cell sum type and the intermediate result set (spec.md §3, §6).

use crate::ids::{NodeId, RelId};
use chrono::{DateTime, Utc};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One cell of a tuple. A superset of `PropertyValue` with entity pointers,
/// arrays, and nested sub-results (spec.md §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Null,
    Node(NodeId),
    Relationship(RelId),
    Int(i64),
    Double(f64),
    UInt(u64),
    String(String),
    DateTime(DateTime<Utc>),
    /// Result of a shortest-path operator: the ordered sequence of node ids.
    NodeArray(Vec<NodeId>),
    /// A materialized sub-result (e.g. grouped tuples fed into `Aggregate`).
    SubResult(Vec<Tuple>),
}

impl Cell {
    pub fn type_tag(&self) -> &'static str {
        match self {
            Cell::Null => "null",
            Cell::Node(_) => "node",
            Cell::Relationship(_) => "relationship",
            Cell::Int(_) => "int",
            Cell::Double(_) => "double",
            Cell::UInt(_) => "uint",
            Cell::String(_) => "string",
            Cell::DateTime(_) => "datetime",
            Cell::NodeArray(_) => "node_array",
            Cell::SubResult(_) => "subresult",
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Cell::Node(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_relationship(&self) -> Option<RelId> {
        match self {
            Cell::Relationship(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Cell::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Cell::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Cell::UInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// A composite-key id for join/grouping probes: nodes and relationships
    /// probe by their raw id, everything else falls back to a display form.
    pub fn entity_key(&self) -> Option<u64> {
        match self {
            Cell::Node(id) => Some(id.raw()),
            Cell::Relationship(id) => Some(id.raw()),
            _ => None,
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Null => write!(f, ""),
            Cell::Node(id) => write!(f, "n{}", id.raw()),
            Cell::Relationship(id) => write!(f, "r{}", id.raw()),
            Cell::Int(v) => write!(f, "{v}"),
            Cell::Double(v) => write!(f, "{v}"),
            Cell::UInt(v) => write!(f, "{v}"),
            Cell::String(s) => write!(f, "{s}"),
            Cell::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Cell::NodeArray(ids) => {
                write!(f, "[")?;
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", id.raw())?;
                }
                write!(f, "]")
            }
            Cell::SubResult(tuples) => write!(f, "<subresult:{}>", tuples.len()),
        }
    }
}

/// The current row flowing through a pipeline. Producers append new cells
/// to the tail; consumers read positional fields.
pub type Tuple = Vec<Cell>;

/// Helpers used by the filter evaluator and projection operator to report
/// `TypeMismatch` errors with the offending position and tag.
pub trait TupleExt {
    fn get_cell(&self, pos: usize) -> Option<&Cell>;
    fn push_cell(&mut self, cell: Cell);
}

impl TupleExt for Tuple {
    fn get_cell(&self, pos: usize) -> Option<&Cell> {
        self.get(pos)
    }

    fn push_cell(&mut self, cell: Cell) {
        self.push(cell);
    }
}

/// An ordered, append-only sequence of tuples produced by a pipeline.
/// Writes are serialized through a mutex (multiple scan-chunk threads can
/// append concurrently); `notify()` wakes anyone blocked waiting for the
/// pipeline to drain, matching the `joiner`/`grouper` locking shape in the
/// original engine's codegen runtime.
#[derive(Debug, Default)]
pub struct ResultSet {
    inner: Mutex<Vec<Tuple>>,
    drained: Condvar,
    done: Mutex<bool>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, tuple: Tuple) {
        self.inner.lock().push(tuple);
    }

    pub fn append_many(&self, tuples: impl IntoIterator<Item = Tuple>) {
        self.inner.lock().extend(tuples);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the current data. Only meaningful to call after the
    /// producing pipeline has drained.
    pub fn data(&self) -> Vec<Tuple> {
        self.inner.lock().clone()
    }

    /// Replaces the contents, used by blocking operators (`OrderBy`) during
    /// their finish phase.
    pub fn replace(&self, tuples: Vec<Tuple>) {
        *self.inner.lock() = tuples;
    }

    /// Called once the producing pipeline drains; wakes any waiter blocked
    /// in `wait_until_notified`.
    pub fn notify(&self) {
        *self.done.lock() = true;
        self.drained.notify_all();
    }

    pub fn wait_until_notified(&self) {
        let mut done = self.done.lock();
        if !*done {
            self.drained.wait(&mut done);
        }
    }
}

/// Shared handle to a result set, since the driver hands the same sink to
/// every pipeline thread.
pub type SharedResultSet = Arc<ResultSet>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_is_order_preserving() {
        let rs = ResultSet::new();
        rs.append(vec![Cell::Int(1)]);
        rs.append(vec![Cell::Int(2)]);
        assert_eq!(rs.data(), vec![vec![Cell::Int(1)], vec![Cell::Int(2)]]);
    }

    #[test]
    fn entity_key_only_defined_for_entities() {
        assert_eq!(Cell::Node(NodeId(1)).entity_key(), Some(1));
        assert_eq!(Cell::Int(1).entity_key(), None);
    }
}
