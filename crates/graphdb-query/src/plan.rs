//! Operator algebra (spec.md §4.3), grounded on
//! `examples/original_source/src/query/codegen/operators/*.cpp` for
//! per-operator semantics and on spec.md §9's "arena of operator nodes
//! addressed by indices" guidance for the structural shape — not
//! `Rc`/trait-object subscriber chains, since plans are trees and cycles
//! are structurally impossible.

use crate::expr::{self, Expr};
use crate::grouper::Grouper;
use crate::sidetable::SideTable;
use graphdb_analytics::{
    adjacency, k_weighted_shortest_path, unweighted_shortest_path, weighted_shortest_path,
};
use graphdb_core::{
    Cell, DictCode, Direction, ExecConfig, GraphStore, NodeId, PropertyValue, Relationship,
    Result, Tuple, TupleExt, TxnFlag, Xid,
};
use graphdb_core::Error;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Signals `Limit`'s early-termination request back to the driving scan
/// loop (spec.md §4.3, §5 "Cancellation").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushResult {
    Continue,
    StopPipeline,
}

/// One item of a `Projection` operator (spec.md §4.3).
#[derive(Debug, Clone)]
pub enum ProjectionItem {
    Forward(usize),
    Property { pos: usize, key: DictCode, result_type: &'static str },
    Udf(String, Vec<usize>),
    Conditional { pos: usize, has_properties: Vec<DictCode>, then_str: String, else_str: String },
}

/// Aggregate kinds available from `Aggregate` (spec.md §4.3, §4.6).
#[derive(Debug, Clone, Copy)]
pub enum AggregateKind {
    Count,
    PCount,
    SumInt,
    SumDouble,
    SumUInt,
    Avg,
}

#[derive(Debug, Clone)]
pub struct AggregateSpec {
    pub kind: AggregateKind,
    /// Tuple position the aggregate reads from, within each grouped tuple.
    pub position: usize,
}

/// How `OrderBy`'s finish-phase sort compares two tuples.
pub type Comparator = Arc<dyn Fn(&Tuple, &Tuple) -> std::cmp::Ordering + Send + Sync>;

/// The tagged variant over every operator spec.md §4.3 names (scan through
/// DML). Per-operator mutable state (a `Limit` counter, an `OrderBy`
/// buffer, a `Distinct` seen-set) is behind its own lock since scan-rooted
/// pipelines push into the same arena node from multiple `rayon` threads.
pub enum OperatorKind {
    Scan { labels: Vec<DictCode> },
    IndexScan { label: DictCode, property: DictCode, value: PropertyValue },
    ForeachRelationship { dir: Direction, label: DictCode, hops: Option<(u32, u32)> },
    Expand { dir: Direction, labels: Option<Vec<DictCode>> },
    NodeHasLabel { label: DictCode },
    FilterTuple { expr: Expr },
    Projection { items: Vec<ProjectionItem> },
    Limit { n: usize, seen: AtomicUsize },
    OrderBy { comparator: Comparator, buffer: Mutex<Vec<Tuple>> },
    GroupBy { key_positions: Vec<usize>, grouper: Arc<Grouper> },
    Aggregate { grouper: Arc<Grouper>, specs: Vec<AggregateSpec> },
    Distinct { seen: Mutex<Vec<Tuple>> },
    UnionAll,
    EndPipeline { target: Arc<dyn SideTable> },
    CrossJoin { side: Arc<dyn SideTable> },
    NestedLoopJoin { left_pos: usize, right_pos: usize, side: Arc<dyn SideTable> },
    HashJoin { left_pos: usize, right_pos: usize, side: Arc<dyn SideTable> },
    LeftOuterJoin { left_pos: usize, right_pos: usize, side: Arc<dyn SideTable> },
    ShortestPathOp { label: DictCode, bidirectional: bool, all_paths: bool },
    WeightedShortestPathOp { label: DictCode, weight_key: Option<DictCode>, bidirectional: bool, all_paths: bool },
    KWeightedShortestPathOp { label: DictCode, weight_key: Option<DictCode>, bidirectional: bool, k: usize },
    CreateNode { label: DictCode, properties: HashMap<DictCode, PropertyValue> },
    CreateRelationship { label: DictCode, from_pos: usize, to_pos: usize, properties: HashMap<DictCode, PropertyValue> },
    UpdateNode { properties: HashMap<DictCode, PropertyValue> },
    DetachNode,
    RemoveNode,
    RemoveRelationship,
}

/// One arena slot: an operator, its stable id (spec.md §4.3), and its
/// downstream subscriber (`None` for a plan's terminal operator).
pub struct OperatorNode {
    pub operator_id: i64,
    pub kind: OperatorKind,
    pub subscriber: Option<usize>,
}

/// A linear chain of operators from a driving source (`Scan`/`IndexScan`/a
/// DML source) to either an `EndPipeline` (closing into a side-table) or a
/// plan-terminal operator (spec.md §2's "left-deep chain of unary operators
/// broken by binary operators").
pub struct Pipeline {
    pub root: usize,
}

/// Per-thread execution context threaded through every operator's push path
/// (spec.md §9's "thread-local scratch" note, made an explicit argument
/// instead of a thread-local map).
pub struct ExecCtx<'a> {
    pub store: &'a dyn GraphStore,
    pub xid: Xid,
    pub config: &'a ExecConfig,
    pub result_set: &'a graphdb_core::ResultSet,
}

/// The operator arena plus the pipeline list the driver iterates in
/// dependency order (right pipelines materialize their side-tables before
/// any pipeline that reads them runs).
pub struct Plan {
    pub nodes: Vec<OperatorNode>,
    pub pipelines: Vec<Pipeline>,
}

impl Plan {
    fn node(&self, idx: usize) -> &OperatorNode {
        &self.nodes[idx]
    }

    /// Hands `tuple` to `idx`'s downstream subscriber, or — for a plan's
    /// terminal operator (`subscriber == None`) — collects it into the
    /// pipeline's result set (spec.md §2: "collected into a result set").
    /// `EndPipeline` never reaches this path: it materializes directly into
    /// its side-table instead of forwarding to a subscriber.
    fn push_to_subscriber(&self, idx: usize, tuple: Tuple, ctx: &ExecCtx) -> Result<PushResult> {
        match self.node(idx).subscriber {
            Some(sub) => self.push(sub, tuple, ctx),
            None => {
                ctx.result_set.append(tuple);
                Ok(PushResult::Continue)
            }
        }
    }

    /// Runs a single tuple through operator `idx`, recursing into its
    /// subscriber for every tuple it produces.
    pub fn push(&self, idx: usize, mut tuple: Tuple, ctx: &ExecCtx) -> Result<PushResult> {
        let operator_id = self.node(idx).operator_id;
        match &self.node(idx).kind {
            OperatorKind::Scan { .. } | OperatorKind::IndexScan { .. } => {
                // Driving operators are pumped by the driver, not pushed into.
                self.push_to_subscriber(idx, tuple, ctx)
            }

            OperatorKind::ForeachRelationship { dir, label, hops } => {
                let Some(node_id) = tuple.last().and_then(Cell::as_node) else {
                    return Ok(PushResult::Continue);
                };
                match hops {
                    None => {
                        let mut rels = Vec::new();
                        adjacency::foreach(ctx.store, node_id, *dir, ctx.xid, |r| {
                            if r.label == *label {
                                rels.push(r.clone())
                            }
                        })
                        ?;
                        let mut result = PushResult::Continue;
                        for r in rels {
                            let mut t = tuple.clone();
                            t.push_cell(Cell::Relationship(r.id));
                            if self.push_to_subscriber(idx, t, ctx)? == PushResult::StopPipeline {
                                result = PushResult::StopPipeline;
                                break;
                            }
                        }
                        Ok(result)
                    }
                    Some((min, max)) => {
                        let mut rels = Vec::new();
                        match dir {
                            Direction::Out => adjacency::variable_length_outgoing(
                                ctx.store, node_id, *label, *min, *max, ctx.xid,
                                |_path, r| rels.push(r.clone()),
                            ),
                            Direction::In => adjacency::variable_length_incoming(
                                ctx.store, node_id, *label, *min, *max, ctx.xid,
                                |_path, r| rels.push(r.clone()),
                            ),
                        }
                        ?;
                        let mut result = PushResult::Continue;
                        for r in rels {
                            let mut t = tuple.clone();
                            t.push_cell(Cell::Relationship(r.id));
                            if self.push_to_subscriber(idx, t, ctx)? == PushResult::StopPipeline {
                                result = PushResult::StopPipeline;
                                break;
                            }
                        }
                        Ok(result)
                    }
                }
            }

            OperatorKind::Expand { dir, labels } => {
                let Some(rid) = tuple.last().and_then(Cell::as_relationship) else {
                    return Ok(PushResult::Continue);
                };
                let r = ctx.store.rship_by_id(rid)?;
                let opposite = match dir {
                    Direction::Out => r.dst,
                    Direction::In => r.src,
                };
                let opposite_node = ctx.store.get_valid_node_version(opposite, ctx.xid)?;
                if let Some(allowed) = labels {
                    if !allowed.contains(&opposite_node.label) {
                        return Ok(PushResult::Continue);
                    }
                }
                tuple.push_cell(Cell::Node(opposite));
                self.push_to_subscriber(idx, tuple, ctx)
            }

            OperatorKind::NodeHasLabel { label } => {
                let Some(node_id) = tuple.last().and_then(Cell::as_node) else {
                    return Ok(PushResult::Continue);
                };
                let node = ctx.store.get_valid_node_version(node_id, ctx.xid)?;
                if node.label != *label {
                    return Ok(PushResult::Continue);
                }
                self.push_to_subscriber(idx, tuple, ctx)
            }

            OperatorKind::FilterTuple { expr } => {
                if expr::eval(expr, &tuple, ctx.store)? {
                    self.push_to_subscriber(idx, tuple, ctx)
                } else {
                    Ok(PushResult::Continue)
                }
            }

            OperatorKind::Projection { items } => {
                let mut out = Tuple::with_capacity(items.len());
                for item in items {
                    out.push_cell(self.project_item(item, &tuple, ctx, operator_id)?);
                }
                self.push_to_subscriber(idx, out, ctx)
            }

            OperatorKind::Limit { n, seen } => {
                let prev = seen.fetch_add(1, Ordering::SeqCst);
                if prev >= *n {
                    return Ok(PushResult::StopPipeline);
                }
                let r = self.push_to_subscriber(idx, tuple, ctx)?;
                if prev + 1 >= *n {
                    Ok(PushResult::StopPipeline)
                } else {
                    Ok(r)
                }
            }

            OperatorKind::OrderBy { buffer, .. } => {
                buffer.lock().push(tuple);
                Ok(PushResult::Continue)
            }

            OperatorKind::GroupBy { key_positions, grouper } => {
                grouper.add_to_group(tuple, key_positions);
                Ok(PushResult::Continue)
            }

            OperatorKind::Distinct { seen } => {
                let mut seen = seen.lock();
                if seen.iter().any(|t| t == &tuple) {
                    Ok(PushResult::Continue)
                } else {
                    seen.push(tuple.clone());
                    drop(seen);
                    self.push_to_subscriber(idx, tuple, ctx)
                }
            }

            OperatorKind::UnionAll => self.push_to_subscriber(idx, tuple, ctx),

            OperatorKind::EndPipeline { target } => {
                target.insert(tuple);
                Ok(PushResult::Continue)
            }

            OperatorKind::CrossJoin { side } => {
                let mut result = PushResult::Continue;
                for right in side.all() {
                    let mut out = tuple.clone();
                    out.extend(right);
                    if self.push_to_subscriber(idx, out, ctx)? == PushResult::StopPipeline {
                        result = PushResult::StopPipeline;
                        break;
                    }
                }
                Ok(result)
            }

            OperatorKind::NestedLoopJoin { left_pos, right_pos, side } => {
                let Some(left_key) = tuple.get_cell(*left_pos).and_then(Cell::entity_key) else {
                    return Ok(PushResult::Continue);
                };
                let mut result = PushResult::Continue;
                for right in side.all() {
                    if right.get_cell(*right_pos).and_then(Cell::entity_key) == Some(left_key) {
                        let mut out = tuple.clone();
                        out.extend(right);
                        if self.push_to_subscriber(idx, out, ctx)? == PushResult::StopPipeline {
                            result = PushResult::StopPipeline;
                            break;
                        }
                    }
                }
                Ok(result)
            }

            OperatorKind::HashJoin { left_pos, right_pos, side } => {
                let Some(left_key) = tuple.get_cell(*left_pos).and_then(Cell::entity_key) else {
                    return Ok(PushResult::Continue);
                };
                let mut result = PushResult::Continue;
                for right in side.probe(left_key) {
                    if right.get_cell(*right_pos).and_then(Cell::entity_key) == Some(left_key) {
                        let mut out = tuple.clone();
                        out.extend(right);
                        if self.push_to_subscriber(idx, out, ctx)? == PushResult::StopPipeline {
                            result = PushResult::StopPipeline;
                            break;
                        }
                    }
                }
                Ok(result)
            }

            OperatorKind::LeftOuterJoin { left_pos, right_pos, side } => {
                let Some(left_key) = tuple.get_cell(*left_pos).and_then(Cell::entity_key) else {
                    return Ok(PushResult::Continue);
                };
                let matches: Vec<Tuple> = side
                    .all()
                    .into_iter()
                    .filter(|right| right.get_cell(*right_pos).and_then(Cell::entity_key) == Some(left_key))
                    .collect();
                if matches.is_empty() {
                    let mut out = tuple.clone();
                    out.push_cell(Cell::Null);
                    self.push_to_subscriber(idx, out, ctx)
                } else {
                    let mut result = PushResult::Continue;
                    for right in matches {
                        let mut out = tuple.clone();
                        out.extend(right);
                        if self.push_to_subscriber(idx, out, ctx)? == PushResult::StopPipeline {
                            result = PushResult::StopPipeline;
                            break;
                        }
                    }
                    Ok(result)
                }
            }

            OperatorKind::ShortestPathOp { label, bidirectional, all_paths } => {
                self.run_shortest_path(idx, tuple, ctx, *label, *bidirectional, *all_paths)
            }

            OperatorKind::WeightedShortestPathOp { label, weight_key, bidirectional, all_paths } => {
                self.run_weighted_shortest_path(idx, tuple, ctx, *label, *weight_key, *bidirectional, *all_paths)
            }

            OperatorKind::KWeightedShortestPathOp { label, weight_key, bidirectional, k } => {
                self.run_k_shortest_path(idx, tuple, ctx, *label, *weight_key, *bidirectional, *k)
            }

            OperatorKind::CreateNode { label, properties } => {
                let id = ctx.store.add_node(*label, properties.clone(), TxnFlag::Dirty, ctx.xid)?;
                tuple.push_cell(Cell::Node(id));
                self.push_to_subscriber(idx, tuple, ctx)
            }

            OperatorKind::CreateRelationship { label, from_pos, to_pos, properties } => {
                let from = tuple.get_cell(*from_pos).and_then(Cell::as_node).ok_or(Error::TypeMismatch {
                    operator_id,
                    expected: "node".into(),
                    found: "other".into(),
                })?;
                let to = tuple.get_cell(*to_pos).and_then(Cell::as_node).ok_or(Error::TypeMismatch {
                    operator_id,
                    expected: "node".into(),
                    found: "other".into(),
                })?;
                let id = ctx
                    .store
                    .add_relationship(from, to, *label, properties.clone(), TxnFlag::Dirty, ctx.xid)?;
                tuple.push_cell(Cell::Relationship(id));
                self.push_to_subscriber(idx, tuple, ctx)
            }

            OperatorKind::UpdateNode { properties } => {
                let Some(node_id) = tuple.last().and_then(Cell::as_node) else {
                    return Ok(PushResult::Continue);
                };
                ctx.store.update_node(node_id, properties.clone(), ctx.xid)?;
                self.push_to_subscriber(idx, tuple, ctx)
            }

            OperatorKind::DetachNode => {
                let Some(node_id) = tuple.last().and_then(Cell::as_node) else {
                    return Ok(PushResult::Continue);
                };
                ctx.store.detach_node(node_id, ctx.xid)?;
                self.push_to_subscriber(idx, tuple, ctx)
            }

            OperatorKind::RemoveNode => {
                let Some(node_id) = tuple.last().and_then(Cell::as_node) else {
                    return Ok(PushResult::Continue);
                };
                ctx.store.remove_node(node_id, ctx.xid)?;
                self.push_to_subscriber(idx, tuple, ctx)
            }

            OperatorKind::RemoveRelationship => {
                let Some(rid) = tuple.last().and_then(Cell::as_relationship) else {
                    return Ok(PushResult::Continue);
                };
                ctx.store.delete_relationship_txn(rid, ctx.xid)?;
                self.push_to_subscriber(idx, tuple, ctx)
            }

            OperatorKind::Aggregate { .. } => {
                // Aggregate only produces output during finish(); mid-pipeline
                // pushes pass the tuple through unchanged.
                self.push_to_subscriber(idx, tuple, ctx)
            }
        }
    }

    fn project_item(&self, item: &ProjectionItem, tuple: &Tuple, ctx: &ExecCtx, operator_id: i64) -> Result<Cell> {
        match item {
            ProjectionItem::Forward(pos) => Ok(tuple.get_cell(*pos).cloned().unwrap_or(Cell::Null)),
            ProjectionItem::Property { pos, key, result_type } => {
                let entity = tuple.get_cell(*pos).ok_or(Error::UnknownProperty {
                    operator_id,
                    key: format!("{key}"),
                })?;
                let props = match entity {
                    Cell::Node(id) => ctx.store.get_node_description(*id)?.properties,
                    Cell::Relationship(id) => ctx.store.get_rship_description(*id)?.properties,
                    _ => {
                        return Err(Error::TypeMismatch {
                            operator_id,
                            expected: "node or relationship".into(),
                            found: entity.type_tag().into(),
                        })
                    }
                };
                let value = props.get(key).cloned().unwrap_or(PropertyValue::Null);
                Ok(coerce_property(value, result_type, ctx.store))
            }
            ProjectionItem::Udf(_name, args) => {
                // No user functions are registered by default; forwards the
                // first argument unchanged, matching an identity UDF.
                Ok(args.first().and_then(|p| tuple.get_cell(*p)).cloned().unwrap_or(Cell::Null))
            }
            ProjectionItem::Conditional { pos, has_properties, then_str, else_str } => {
                let entity = tuple.get_cell(*pos).ok_or(Error::UnknownProperty {
                    operator_id,
                    key: "conditional".into(),
                })?;
                let props = match entity {
                    Cell::Node(id) => ctx.store.get_node_description(*id)?.properties,
                    Cell::Relationship(id) => ctx.store.get_rship_description(*id)?.properties,
                    _ => return Ok(Cell::String(else_str.clone())),
                };
                let all_present = has_properties.iter().all(|k| props.contains_key(k));
                Ok(Cell::String(if all_present { then_str.clone() } else { else_str.clone() }))
            }
        }
    }

    fn run_shortest_path(
        &self,
        idx: usize,
        tuple: Tuple,
        ctx: &ExecCtx,
        label: DictCode,
        bidirectional: bool,
        all_paths: bool,
    ) -> Result<PushResult> {
        let operator_id = self.node(idx).operator_id;
        let (start, stop) = source_and_target(&tuple, operator_id)?;
        let rpred = |r: &Relationship| r.label == label;
        let paths = if all_paths {
            graphdb_analytics::all_unweighted_shortest_paths(ctx.store, ctx.xid, start, stop, bidirectional, &rpred)?
        } else {
            unweighted_shortest_path(ctx.store, ctx.xid, start, stop, bidirectional, &rpred)?
                .into_iter()
                .collect()
        };
        let mut result = PushResult::Continue;
        for p in paths {
            let mut out = tuple.clone();
            out.push_cell(Cell::NodeArray(p.path));
            if self.push_to_subscriber(idx, out, ctx)? == PushResult::StopPipeline {
                result = PushResult::StopPipeline;
                break;
            }
        }
        Ok(result)
    }

    fn run_weighted_shortest_path(
        &self,
        idx: usize,
        tuple: Tuple,
        ctx: &ExecCtx,
        label: DictCode,
        weight_key: Option<DictCode>,
        bidirectional: bool,
        all_paths: bool,
    ) -> Result<PushResult> {
        let operator_id = self.node(idx).operator_id;
        let (start, stop) = source_and_target(&tuple, operator_id)?;
        let rpred = |r: &Relationship| r.label == label;
        let weight_fn = |r: &Relationship| weight_of(ctx.store, r, weight_key);
        let paths = if all_paths {
            graphdb_analytics::all_weighted_shortest_paths(ctx.store, ctx.xid, start, stop, bidirectional, &rpred, &weight_fn)?
        } else {
            weighted_shortest_path(ctx.store, ctx.xid, start, stop, bidirectional, &rpred, &weight_fn)?
                .into_iter()
                .collect()
        };
        let mut result = PushResult::Continue;
        for p in paths {
            let mut out = tuple.clone();
            out.push_cell(Cell::NodeArray(p.path));
            out.push_cell(Cell::Double(p.weight));
            if self.push_to_subscriber(idx, out, ctx)? == PushResult::StopPipeline {
                result = PushResult::StopPipeline;
                break;
            }
        }
        Ok(result)
    }

    fn run_k_shortest_path(
        &self,
        idx: usize,
        tuple: Tuple,
        ctx: &ExecCtx,
        label: DictCode,
        weight_key: Option<DictCode>,
        bidirectional: bool,
        k: usize,
    ) -> Result<PushResult> {
        let operator_id = self.node(idx).operator_id;
        let (start, stop) = source_and_target(&tuple, operator_id)?;
        let rpred = |r: &Relationship| r.label == label;
        let weight_fn = |r: &Relationship| weight_of(ctx.store, r, weight_key);
        let (paths, _found_all) =
            k_weighted_shortest_path(ctx.store, ctx.xid, start, stop, k, bidirectional, &rpred, &weight_fn)?;
        let mut result = PushResult::Continue;
        for p in paths {
            let mut out = tuple.clone();
            out.push_cell(Cell::NodeArray(p.path));
            out.push_cell(Cell::Double(p.weight));
            if self.push_to_subscriber(idx, out, ctx)? == PushResult::StopPipeline {
                result = PushResult::StopPipeline;
                break;
            }
        }
        Ok(result)
    }

    /// Finish-phase hook for blocking operators (spec.md §4.3): sorts into
    /// the result set (`OrderBy`), emits group-key tuples (`GroupBy`), or
    /// emits aggregate cells (`Aggregate`). No-op for streaming operators.
    pub fn finish(&self, idx: usize, ctx: &ExecCtx) -> Result<()> {
        match &self.node(idx).kind {
            OperatorKind::OrderBy { comparator, buffer } => {
                let mut rows = buffer.lock().clone();
                rows.sort_by(|a, b| comparator(a, b));
                for row in rows {
                    self.push_to_subscriber(idx, row, ctx)?;
                }
                Ok(())
            }
            OperatorKind::GroupBy { key_positions, grouper } => {
                for i in 0..grouper.group_count() {
                    if let Some(tuple) = grouper.demat_tuple(i) {
                        let key_tuple: Tuple = key_positions
                            .iter()
                            .filter_map(|&p| tuple.get_cell(p).cloned())
                            .collect();
                        self.push_to_subscriber(idx, key_tuple, ctx)?;
                    }
                }
                Ok(())
            }
            OperatorKind::Aggregate { grouper, specs } => {
                for group in 0..grouper.group_count() {
                    let mut out = Tuple::with_capacity(specs.len());
                    for spec in specs {
                        let cell = match spec.kind {
                            AggregateKind::Count => Cell::UInt(grouper.count(group)),
                            AggregateKind::PCount => Cell::Double(grouper.pcount(group)),
                            AggregateKind::SumInt => Cell::Int(grouper.sum_int(group, spec.position)),
                            AggregateKind::SumDouble => Cell::Double(grouper.sum_double(group, spec.position)),
                            AggregateKind::SumUInt => Cell::UInt(grouper.sum_uint(group, spec.position)),
                            AggregateKind::Avg => Cell::Double(grouper.avg(group, spec.position)),
                        };
                        out.push_cell(cell);
                    }
                    self.push_to_subscriber(idx, out, ctx)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn source_and_target(tuple: &Tuple, operator_id: i64) -> Result<(NodeId, NodeId)> {
    if tuple.len() < 2 {
        return Err(Error::InvalidPlan { operator_id });
    }
    let stop = tuple[tuple.len() - 1].as_node().ok_or(Error::TypeMismatch {
        operator_id,
        expected: "node".into(),
        found: tuple[tuple.len() - 1].type_tag().into(),
    })?;
    let start = tuple[tuple.len() - 2].as_node().ok_or(Error::TypeMismatch {
        operator_id,
        expected: "node".into(),
        found: tuple[tuple.len() - 2].type_tag().into(),
    })?;
    Ok((start, stop))
}

fn weight_of(store: &dyn GraphStore, r: &Relationship, weight_key: Option<DictCode>) -> f64 {
    let Some(key) = weight_key else { return 1.0 };
    match store.get_rship_description(r.id).ok().and_then(|d| d.properties.get(&key).cloned()) {
        Some(PropertyValue::Double(d)) => d,
        Some(PropertyValue::Int(i)) => i as f64,
        Some(PropertyValue::UInt(u)) => u as f64,
        _ => 1.0,
    }
}

fn coerce_property(value: PropertyValue, result_type: &str, store: &dyn GraphStore) -> Cell {
    match (value, result_type) {
        (PropertyValue::Int(v), "double") => Cell::Double(v as f64),
        (PropertyValue::Double(v), "int") => Cell::Int(v as i64),
        (PropertyValue::Int(v), _) => Cell::Int(v),
        (PropertyValue::Double(v), _) => Cell::Double(v),
        (PropertyValue::UInt(v), _) => Cell::UInt(v),
        (PropertyValue::Bool(v), _) => Cell::Int(v as i64),
        (PropertyValue::String(code), _) => Cell::String(store.get_string(code).unwrap_or_default()),
        (PropertyValue::DateTime(dt), _) => Cell::DateTime(dt),
        (PropertyValue::Null, _) => Cell::Null,
    }
}
