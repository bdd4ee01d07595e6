//! graphdb-analytics — adjacency traversal primitives and the shortest-path
//! kernel (spec.md §4.1, §4.2).
//!
//! Everything here is a pure function over a `&dyn GraphStore` snapshot: no
//! state of its own, no locking beyond what the store already does. The
//! operator algebra in `graphdb-query` calls into this crate for
//! `ForeachRelationship`/`Expand` and the shortest-path operators.

pub mod adjacency;
pub mod shortest_path;

pub use adjacency::{foreach, foreach_incoming, foreach_outgoing, variable_length_incoming, variable_length_outgoing};
pub use shortest_path::{
    all_unweighted_shortest_paths, all_weighted_shortest_paths, k_weighted_shortest_path,
    unweighted_shortest_path, weighted_shortest_path, PathItem, RshipPredicate, RshipWeight,
};
