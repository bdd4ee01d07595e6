//! End-to-end operator-pipeline scenario (spec.md §8 scenario 6): a scan
//! feeding a 1-hop traversal and an expand, capped by `Limit`, against three
//! "Person" nodes each with at least one outgoing "knows" relationship.

use graphdb_core::{
    Cell, Direction, ExecConfig, GraphStore, NodeId, PropertyValue, ResultSet, TransactionManager, TxnFlag,
};
use graphdb_query::{
    AggregateKind, AggregateSpec, ExecCtx, Grouper, HashSideTable, NestedLoopSideTable, OperatorKind,
    OperatorNode, Pipeline, Plan, PlanBuilder, QueryDriver, SideTable,
};
use graphdb_txn::{InMemoryTxnManager, MemoryGraphStore, GENESIS};
use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

fn build_store(txn_mgr: Arc<InMemoryTxnManager>) -> MemoryGraphStore {
    let store = MemoryGraphStore::new(txn_mgr);
    let person = store.get_code("Person");
    let knows = store.get_code("knows");
    let a = store.add_node(person, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    let b = store.add_node(person, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    let c = store.add_node(person, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    // Each of the three persons has exactly one outgoing "knows" edge.
    store.add_relationship(a, b, knows, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    store.add_relationship(b, c, knows, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    store.add_relationship(c, a, knows, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    store
}

#[test]
fn limit_expand_foreach_scan_yields_exactly_n_tuples() {
    let txn_mgr = Arc::new(InMemoryTxnManager::new());
    let store = build_store(txn_mgr.clone());
    let person = store.get_code("Person");
    let knows = store.get_code("knows");

    // Plan: Limit(2, Expand(OUT, ForeachRelationship(OUT, "knows", NodeScan("Person")))).
    let nodes = vec![
        OperatorNode { operator_id: 0, kind: OperatorKind::Scan { labels: vec![person] }, subscriber: Some(1) },
        OperatorNode {
            operator_id: 1,
            kind: OperatorKind::ForeachRelationship { dir: Direction::Out, label: knows, hops: None },
            subscriber: Some(2),
        },
        OperatorNode {
            operator_id: 2,
            kind: OperatorKind::Expand { dir: Direction::Out, labels: None },
            subscriber: Some(3),
        },
        OperatorNode {
            operator_id: 3,
            kind: OperatorKind::Limit { n: 2, seen: AtomicUsize::new(0) },
            subscriber: None,
        },
    ];
    let plan = Plan { nodes, pipelines: vec![Pipeline { root: 0 }] };

    let config = ExecConfig::new().with_scan_chunks(1);
    let driver = QueryDriver::with_config(&store, &txn_mgr, config);
    let (result_set, _profiles) = driver.execute(&plan).unwrap();

    let rows = result_set.data();
    assert_eq!(rows.len(), 2, "Limit(2) must emit exactly min(2, |upstream|) tuples");
    for row in &rows {
        assert_eq!(row.len(), 3, "each tuple has shape (Person, knows-rel, Person)");
        assert!(matches!(row[0], Cell::Node(_)));
        assert!(matches!(row[1], Cell::Relationship(_)));
        assert!(matches!(row[2], Cell::Node(_)));
    }
}

#[test]
fn cross_join_emits_cardinality_product() {
    use graphdb_query::sidetable::CrossSideTable;
    use graphdb_query::SideTable;

    let txn_mgr = Arc::new(InMemoryTxnManager::new());
    let store = build_store(txn_mgr.clone());
    let person = store.get_code("Person");

    let side = Arc::new(CrossSideTable::new());
    for _ in 0..3 {
        side.insert(vec![Cell::Int(1)]);
    }

    let nodes = vec![
        OperatorNode { operator_id: 0, kind: OperatorKind::Scan { labels: vec![person] }, subscriber: Some(1) },
        OperatorNode { operator_id: 1, kind: OperatorKind::CrossJoin { side: side.clone() }, subscriber: None },
    ];
    let plan = Plan { nodes, pipelines: vec![Pipeline { root: 0 }] };

    let config = ExecConfig::new().with_scan_chunks(1);
    let driver = QueryDriver::with_config(&store, &txn_mgr, config);
    let (result_set, _profiles) = driver.execute(&plan).unwrap();

    // 3 persons x 3 right-side rows = 9 tuples.
    assert_eq!(result_set.len(), 9);
}

#[test]
fn group_by_identity_projection_yields_one_group_per_tuple() {
    let txn_mgr = Arc::new(InMemoryTxnManager::new());
    let store = build_store(txn_mgr.clone());
    let person = store.get_code("Person");

    let grouper = Arc::new(Grouper::new());
    let plan = PlanBuilder::new()
        .scan(vec![person])
        .group_by(vec![0], grouper.clone())
        .build();

    let config = ExecConfig::new().with_scan_chunks(1);
    let driver = QueryDriver::with_config(&store, &txn_mgr, config);
    driver.execute(&plan).unwrap();

    // Grouping by the identity (node-id) projection: one group per node.
    assert_eq!(grouper.group_count(), 3);
    assert_eq!(grouper.total_count(), 3);
}

#[test]
fn aggregate_count_over_scan_matches_node_count() {
    let txn_mgr = Arc::new(InMemoryTxnManager::new());
    let store = build_store(txn_mgr.clone());
    let person = store.get_code("Person");

    let grouper = Arc::new(Grouper::new());
    let plan = PlanBuilder::new()
        .scan(vec![person])
        .group_by(vec![0], grouper.clone())
        .build();

    // Share one grouper across a GroupBy pipeline and a separate Aggregate
    // pipeline reading it, matching the split streaming-vs-finish-time
    // relationship spec.md §4.3/§4.6 describes between `GroupBy` and
    // `Aggregate`.
    let aggregate_plan = PlanBuilder::new()
        .aggregate(grouper.clone(), vec![AggregateSpec { kind: AggregateKind::Count, position: 0 }])
        .build();

    let config = ExecConfig::new().with_scan_chunks(1);
    let driver = QueryDriver::with_config(&store, &txn_mgr, config);
    driver.execute(&plan).unwrap();
    let (result_set, _) = driver.execute(&aggregate_plan).unwrap();

    let rows = result_set.data();
    assert_eq!(rows, vec![vec![Cell::UInt(3)]]);
}

/// Returns the three "Person" node ids alongside the store, for tests that
/// need to key a join or side-table on a specific entity rather than just
/// its cardinality.
fn build_store_with_ids(txn_mgr: Arc<InMemoryTxnManager>) -> (MemoryGraphStore, NodeId, NodeId, NodeId) {
    let store = MemoryGraphStore::new(txn_mgr);
    let person = store.get_code("Person");
    let knows = store.get_code("knows");
    let a = store.add_node(person, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    let b = store.add_node(person, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    let c = store.add_node(person, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    store.add_relationship(a, b, knows, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    store.add_relationship(b, c, knows, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    store.add_relationship(c, a, knows, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    (store, a, b, c)
}

/// spec.md §8's named testable property: `NestedLoopJoin` and `HashJoin`
/// joining the same left scan against right rows keyed on the same entity
/// must produce the same multiset of tuples, driven through `Plan::push`
/// rather than by calling `SideTable` directly.
#[test]
fn nested_loop_and_hash_join_produce_same_multiset_for_same_key() {
    let txn_mgr = Arc::new(InMemoryTxnManager::new());
    let (store, a, b, c) = build_store_with_ids(txn_mgr.clone());
    let person = store.get_code("Person");

    let nested_side = Arc::new(NestedLoopSideTable::new());
    let hash_side = Arc::new(HashSideTable::new(4, 0));
    for id in [a, b, c] {
        nested_side.insert(vec![Cell::Node(id)]);
        hash_side.insert(vec![Cell::Node(id)]);
    }

    let nested_plan = PlanBuilder::new()
        .scan(vec![person])
        .nested_loop_join(0, 0, nested_side)
        .build();
    let hash_plan = PlanBuilder::new()
        .scan(vec![person])
        .hash_join(0, 0, hash_side)
        .build();

    let config = ExecConfig::new().with_scan_chunks(1);
    let driver = QueryDriver::with_config(&store, &txn_mgr, config);
    let (nested_result, _) = driver.execute(&nested_plan).unwrap();
    let (hash_result, _) = driver.execute(&hash_plan).unwrap();

    let as_key_pairs = |rows: Vec<Vec<Cell>>| -> Vec<(u64, u64)> {
        let mut pairs: Vec<(u64, u64)> = rows
            .into_iter()
            .map(|row| (row[0].entity_key().unwrap(), row[1].entity_key().unwrap()))
            .collect();
        pairs.sort_unstable();
        pairs
    };

    let nested_pairs = as_key_pairs(nested_result.data());
    let hash_pairs = as_key_pairs(hash_result.data());
    assert_eq!(nested_pairs, vec![(a.raw(), a.raw()), (b.raw(), b.raw()), (c.raw(), c.raw())]);
    assert_eq!(
        nested_pairs, hash_pairs,
        "NestedLoopJoin and HashJoin on the same key must yield the same multiset"
    );
}

#[test]
fn create_node_pipeline_materializes_new_node() {
    let txn_mgr = Arc::new(InMemoryTxnManager::new());
    let store = MemoryGraphStore::new(txn_mgr.clone());
    let person = store.get_code("Person");
    let name_key = store.get_code("name");
    let name_code = store.get_code("Ada");
    let mut props = HashMap::new();
    props.insert(name_key, PropertyValue::String(name_code));

    let plan = PlanBuilder::new().create_node(person, props).build();
    let driver = QueryDriver::new(&store, &txn_mgr);
    let (result_set, _) = driver.execute(&plan).unwrap();

    let rows = result_set.data();
    assert_eq!(rows.len(), 1);
    let id = rows[0][0].as_node().expect("CreateNode emits the new node id");
    let desc = store.get_node_description(id).unwrap();
    assert_eq!(desc.label, person);
    assert_eq!(desc.properties.get(&name_key), Some(&PropertyValue::String(name_code)));
}

#[test]
fn create_relationship_pipeline_links_two_new_nodes() {
    let txn_mgr = Arc::new(InMemoryTxnManager::new());
    let store = MemoryGraphStore::new(txn_mgr.clone());
    let person = store.get_code("Person");
    let knows = store.get_code("knows");

    let plan = PlanBuilder::new()
        .create_node(person, HashMap::new())
        .create_node(person, HashMap::new())
        .create_relationship(knows, 0, 1, HashMap::new())
        .build();
    let driver = QueryDriver::new(&store, &txn_mgr);
    let (result_set, _) = driver.execute(&plan).unwrap();

    let rows = result_set.data();
    assert_eq!(rows.len(), 1);
    let from = rows[0][0].as_node().unwrap();
    let to = rows[0][1].as_node().unwrap();
    let rel = rows[0][2].as_relationship().expect("CreateRelationship emits the new relationship id");
    let desc = store.get_rship_description(rel).unwrap();
    assert_eq!(desc.label, knows);
    assert_eq!(desc.from_id, from);
    assert_eq!(desc.to_id, to);
}

#[test]
fn update_node_pipeline_writes_property() {
    let txn_mgr = Arc::new(InMemoryTxnManager::new());
    let (store, a, _b, _c) = build_store_with_ids(txn_mgr.clone());
    let person = store.get_code("Person");
    let age_key = store.get_code("age");
    let mut props = HashMap::new();
    props.insert(age_key, PropertyValue::Int(42));

    let plan = PlanBuilder::new().scan(vec![person]).update_node(props).build();
    let driver = QueryDriver::new(&store, &txn_mgr);
    driver.execute(&plan).unwrap();

    // All three persons pass through the same UpdateNode operator; check the
    // one we can name directly.
    let desc = store.get_node_description(a).unwrap();
    assert_eq!(desc.properties.get(&age_key), Some(&PropertyValue::Int(42)));
}

/// Drives a single-tuple `Plan` directly through `Plan::push` under a
/// caller-chosen `xid`, bypassing `QueryDriver::execute`'s internal
/// begin/commit so the test can read back visibility for that same
/// transaction afterwards (spec.md:30, "mutated only by their owning
/// transaction until commit").
fn push_with_xid(plan: &Plan, tuple: Vec<Cell>, store: &MemoryGraphStore, xid: graphdb_core::Xid) {
    let config = ExecConfig::new().with_scan_chunks(1);
    let result_set = ResultSet::new();
    let ctx = ExecCtx { store, xid, config: &config, result_set: &result_set };
    plan.push(plan.pipelines[0].root, tuple, &ctx).unwrap();
}

#[test]
fn detach_node_pipeline_hides_outgoing_relationship_from_its_own_transaction() {
    let txn_mgr = Arc::new(InMemoryTxnManager::new());
    let (store, a, _b, _c) = build_store_with_ids(txn_mgr.clone());
    let person = store.get_code("Person");

    let xid = txn_mgr.begin();
    let mut seen_before = 0;
    store.foreach_from_relationship_of_node(a, xid, &mut |_| seen_before += 1).unwrap();
    assert_eq!(seen_before, 1, "the committed baseline edge is visible before detaching");

    let plan = PlanBuilder::new().scan(vec![person]).detach_node().build();
    push_with_xid(&plan, vec![Cell::Node(a)], &store, xid);

    let mut seen_after = 0;
    store.foreach_from_relationship_of_node(a, xid, &mut |_| seen_after += 1).unwrap();
    assert_eq!(seen_after, 0, "DetachNode must hide the relationship from its own transaction immediately");
}

#[test]
fn remove_node_pipeline_hides_node_from_its_own_transaction() {
    let txn_mgr = Arc::new(InMemoryTxnManager::new());
    let (store, a, _b, _c) = build_store_with_ids(txn_mgr.clone());
    let person = store.get_code("Person");

    let xid = txn_mgr.begin();
    assert!(store.get_valid_node_version(a, xid).is_ok());

    let plan = PlanBuilder::new().scan(vec![person]).remove_node().build();
    push_with_xid(&plan, vec![Cell::Node(a)], &store, xid);

    assert!(
        store.get_valid_node_version(a, xid).is_err(),
        "RemoveNode must retire the node from its own transaction's view"
    );
}

#[test]
fn remove_relationship_pipeline_hides_relationship_from_its_own_transaction() {
    let txn_mgr = Arc::new(InMemoryTxnManager::new());
    let (store, a, _b, _c) = build_store_with_ids(txn_mgr.clone());
    let knows = store.get_code("knows");

    let xid = txn_mgr.begin();
    let mut rel = None;
    store.foreach_from_relationship_of_node(a, xid, &mut |r| rel = Some(r.id)).unwrap();
    let rel = rel.expect("a has an outgoing knows relationship");
    assert!(store.get_valid_rship_version(rel, xid).is_ok());

    let plan = PlanBuilder::new()
        .foreach_relationship(Direction::Out, knows, None)
        .remove_relationship()
        .build();
    push_with_xid(&plan, vec![Cell::Node(a)], &store, xid);

    assert!(
        store.get_valid_rship_version(rel, xid).is_err(),
        "RemoveRelationship must retire the relationship from its own transaction's view"
    );
}

#[test]
fn shortest_path_op_pipeline_finds_two_hop_route() {
    let txn_mgr = Arc::new(InMemoryTxnManager::new());
    let store = MemoryGraphStore::new(txn_mgr.clone());
    let start_label = store.get_code("Start");
    let person = store.get_code("Person");
    let knows = store.get_code("knows");
    let a = store.add_node(start_label, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    let b = store.add_node(person, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    let c = store.add_node(person, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    store.add_relationship(a, b, knows, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    store.add_relationship(b, c, knows, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();

    let side = Arc::new(graphdb_query::CrossSideTable::new());
    side.insert(vec![Cell::Node(c)]);

    let plan = PlanBuilder::new()
        .scan(vec![start_label])
        .cross_join(side)
        .shortest_path(knows, false, false)
        .build();

    let config = ExecConfig::new().with_scan_chunks(1);
    let driver = QueryDriver::with_config(&store, &txn_mgr, config);
    let (result_set, _) = driver.execute(&plan).unwrap();

    let rows = result_set.data();
    assert_eq!(rows.len(), 1);
    match &rows[0][2] {
        Cell::NodeArray(path) => assert_eq!(path, &vec![a, b, c]),
        other => panic!("expected a NodeArray path cell, got {other:?}"),
    }
}

#[test]
fn weighted_shortest_path_op_pipeline_finds_min_weight_route() {
    let txn_mgr = Arc::new(InMemoryTxnManager::new());
    let store = MemoryGraphStore::new(txn_mgr.clone());
    let start_label = store.get_code("Start");
    let person = store.get_code("Person");
    let knows = store.get_code("knows");
    let weight_key = store.get_code("weight");
    let a = store.add_node(start_label, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    let b1 = store.add_node(person, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    let b2 = store.add_node(person, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    let z = store.add_node(person, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    let mut cheap = HashMap::new();
    cheap.insert(weight_key, PropertyValue::Double(2.0));
    let mut expensive = HashMap::new();
    expensive.insert(weight_key, PropertyValue::Double(4.0));
    store.add_relationship(a, b1, knows, cheap.clone(), TxnFlag::Committed, GENESIS).unwrap();
    store.add_relationship(b1, z, knows, cheap, TxnFlag::Committed, GENESIS).unwrap();
    store.add_relationship(a, b2, knows, expensive.clone(), TxnFlag::Committed, GENESIS).unwrap();
    store.add_relationship(b2, z, knows, expensive, TxnFlag::Committed, GENESIS).unwrap();

    let side = Arc::new(graphdb_query::CrossSideTable::new());
    side.insert(vec![Cell::Node(z)]);

    let plan = PlanBuilder::new()
        .scan(vec![start_label])
        .cross_join(side)
        .weighted_shortest_path(knows, Some(weight_key), false, false)
        .build();

    let config = ExecConfig::new().with_scan_chunks(1);
    let driver = QueryDriver::with_config(&store, &txn_mgr, config);
    let (result_set, _) = driver.execute(&plan).unwrap();

    let rows = result_set.data();
    assert_eq!(rows.len(), 1);
    match (&rows[0][2], &rows[0][3]) {
        (Cell::NodeArray(path), Cell::Double(weight)) => {
            assert_eq!(path, &vec![a, b1, z]);
            assert_eq!(*weight, 4.0);
        }
        other => panic!("expected (NodeArray, Double) cells, got {other:?}"),
    }
}

#[test]
fn k_weighted_shortest_path_op_pipeline_finds_k_routes_in_weight_order() {
    let txn_mgr = Arc::new(InMemoryTxnManager::new());
    let store = MemoryGraphStore::new(txn_mgr.clone());
    let start_label = store.get_code("Start");
    let person = store.get_code("Person");
    let knows = store.get_code("knows");
    let weight_key = store.get_code("weight");
    let a = store.add_node(start_label, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    let b1 = store.add_node(person, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    let b2 = store.add_node(person, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    let b3 = store.add_node(person, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    let z = store.add_node(person, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
    let weighted = |w: f64| {
        let mut props = HashMap::new();
        props.insert(weight_key, PropertyValue::Double(w));
        props
    };
    store.add_relationship(a, b1, knows, weighted(5.0), TxnFlag::Committed, GENESIS).unwrap();
    store.add_relationship(b1, z, knows, weighted(0.0), TxnFlag::Committed, GENESIS).unwrap();
    store.add_relationship(a, b2, knows, weighted(7.0), TxnFlag::Committed, GENESIS).unwrap();
    store.add_relationship(b2, z, knows, weighted(0.0), TxnFlag::Committed, GENESIS).unwrap();
    store.add_relationship(a, b3, knows, weighted(9.0), TxnFlag::Committed, GENESIS).unwrap();
    store.add_relationship(b3, z, knows, weighted(0.0), TxnFlag::Committed, GENESIS).unwrap();

    let side = Arc::new(graphdb_query::CrossSideTable::new());
    side.insert(vec![Cell::Node(z)]);

    let plan = PlanBuilder::new()
        .scan(vec![start_label])
        .cross_join(side)
        .k_weighted_shortest_path(knows, Some(weight_key), false, 3)
        .build();

    let config = ExecConfig::new().with_scan_chunks(1);
    let driver = QueryDriver::with_config(&store, &txn_mgr, config);
    let (result_set, _) = driver.execute(&plan).unwrap();

    let rows = result_set.data();
    assert_eq!(rows.len(), 3, "k=3 with three independent diamond routes must yield exactly 3 candidates");
    let weights: Vec<f64> = rows
        .iter()
        .map(|row| match &row[3] {
            Cell::Double(w) => *w,
            other => panic!("expected a Double weight cell, got {other:?}"),
        })
        .collect();
    assert_eq!(weights, vec![5.0, 7.0, 9.0], "Yen's algorithm yields candidates in non-decreasing weight order");
}
