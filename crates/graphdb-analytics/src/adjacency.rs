//! Adjacency traversal primitives (spec.md §4.1), grounded on
//! `examples/original_source/src/analytics/shortest_path.cpp`'s use of
//! `foreach_from_relationship_of_node`/`foreach_to_relationship_of_node`.
//!
//! Each call is a consistent read against the transaction's snapshot; no
//! intermediate relationship list is exposed beyond the visitor callback.

use graphdb_core::{DictCode, Direction, GraphStore, NodeId, Relationship, Result, Xid};

/// Walks `n`'s outgoing relationships, visiting every version visible to
/// `xid` in adjacency-list order.
pub fn foreach_outgoing(
    store: &dyn GraphStore,
    n: NodeId,
    xid: Xid,
    mut visit: impl FnMut(&Relationship),
) -> Result<()> {
    store.foreach_from_relationship_of_node(n, xid, &mut visit)
}

/// Symmetric to [`foreach_outgoing`] via the incoming list.
pub fn foreach_incoming(
    store: &dyn GraphStore,
    n: NodeId,
    xid: Xid,
    mut visit: impl FnMut(&Relationship),
) -> Result<()> {
    store.foreach_to_relationship_of_node(n, xid, &mut visit)
}

/// Direction-polymorphic dispatcher so the operator algebra's
/// `ForeachRelationship` doesn't match on direction itself (supplementing
/// spec.md §4.1 per spec.md §9's Rust-idiomatic trait/enum guidance).
pub fn foreach(
    store: &dyn GraphStore,
    n: NodeId,
    dir: Direction,
    xid: Xid,
    visit: impl FnMut(&Relationship),
) -> Result<()> {
    match dir {
        Direction::Out => foreach_outgoing(store, n, xid, visit),
        Direction::In => foreach_incoming(store, n, xid, visit),
    }
}

/// BFS over outgoing relationships labeled `label`, enumerating every path
/// of length `h` with `min <= h <= max`; each visited relationship is fed
/// to `visit` in BFS order together with the path reaching it (spec.md
/// §4.1).
pub fn variable_length_outgoing(
    store: &dyn GraphStore,
    n: NodeId,
    label: DictCode,
    min: u32,
    max: u32,
    xid: Xid,
    visit: impl FnMut(&[NodeId], &Relationship),
) -> Result<()> {
    variable_length(store, n, label, min, max, xid, Direction::Out, visit)
}

/// Symmetric `variable_length_incoming`, supplementing spec.md §4.1: the
/// `ForeachRelationship` operator needs both directions for variable-length
/// hops (spec.md §4.3), and `foreach_variable_from_relationship_of_node`
/// appears direction-generic in `examples/original_source`.
pub fn variable_length_incoming(
    store: &dyn GraphStore,
    n: NodeId,
    label: DictCode,
    min: u32,
    max: u32,
    xid: Xid,
    visit: impl FnMut(&[NodeId], &Relationship),
) -> Result<()> {
    variable_length(store, n, label, min, max, xid, Direction::In, visit)
}

fn variable_length(
    store: &dyn GraphStore,
    n: NodeId,
    label: DictCode,
    min: u32,
    max: u32,
    xid: Xid,
    dir: Direction,
    mut visit: impl FnMut(&[NodeId], &Relationship),
) -> Result<()> {
    let mut frontier: Vec<Vec<NodeId>> = vec![vec![n]];
    for hop in 1..=max.max(min) {
        let mut next_frontier = Vec::new();
        for path in &frontier {
            let cur = *path.last().expect("path always has a start node");
            let mut rels = Vec::new();
            foreach(store, cur, dir, xid, |r| rels.push(r.clone()))?;
            for r in rels {
                if r.label != label {
                    continue;
                }
                let neighbor = if dir == Direction::Out { r.dst } else { r.src };
                let mut new_path = path.clone();
                new_path.push(neighbor);
                if hop >= min {
                    visit(&new_path, &r);
                }
                next_frontier.push(new_path);
            }
        }
        frontier = next_frontier;
        if frontier.is_empty() {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphdb_txn::{InMemoryTxnManager, MemoryGraphStore, GENESIS};
    use graphdb_core::TxnFlag;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn linear_graph(hops: usize) -> (MemoryGraphStore, Vec<NodeId>, DictCode) {
        let store = MemoryGraphStore::new(Arc::new(InMemoryTxnManager::new()));
        let label = store.get_code("Person");
        let knows = store.get_code("knows");
        let mut nodes = Vec::new();
        for _ in 0..=hops {
            nodes.push(
                store
                    .add_node(label, HashMap::new(), TxnFlag::Committed, GENESIS)
                    .unwrap(),
            );
        }
        for w in nodes.windows(2) {
            store
                .add_relationship(w[0], w[1], knows, HashMap::new(), TxnFlag::Committed, GENESIS)
                .unwrap();
        }
        (store, nodes, knows)
    }

    #[test]
    fn foreach_outgoing_visits_every_visible_relationship_once() {
        let (store, nodes, _) = linear_graph(1);
        let mut seen = 0;
        foreach_outgoing(&store, nodes[0], GENESIS, |_| seen += 1).unwrap();
        assert_eq!(seen, 1);
    }

    #[test]
    fn variable_length_enumerates_paths_within_bounds() {
        let (store, nodes, knows) = linear_graph(3);
        let mut paths = Vec::new();
        variable_length_outgoing(&store, nodes[0], knows, 1, 3, GENESIS, |path, _| {
            paths.push(path.to_vec());
        })
        .unwrap();
        // hop 1: [0,1]; hop 2: [0,1,2]; hop 3: [0,1,2,3]
        assert_eq!(paths.len(), 3);
        assert_eq!(paths[2], nodes);
    }

    #[test]
    fn variable_length_respects_min_hops() {
        let (store, nodes, knows) = linear_graph(3);
        let mut paths = Vec::new();
        variable_length_outgoing(&store, nodes[0], knows, 2, 3, GENESIS, |path, _| {
            paths.push(path.to_vec());
        })
        .unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.len() - 1 >= 2));
    }
}
