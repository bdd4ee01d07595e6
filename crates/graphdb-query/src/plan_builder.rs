//! A thin, non-parsing fluent builder for constructing `Plan`s (SPEC_FULL.md
//! "Query driver" module), in the consuming-builder style
//! `examples/omar16100-parsnip`'s `parsnip_core::query::SearchQuery` uses
//! (`pub fn with_x(mut self, ...) -> Self`).
//!
//! spec.md treats "an operator tree constructed externally" as a given — the
//! AST/parser that would normally build one is out of scope — but a
//! complete, testable crate needs *something* in-repo to assemble plans
//! without hand-threading `operator_id`/`subscriber` arithmetic. This is
//! that something: it appends operators to a chain, wiring each one's
//! `subscriber` to the next, and tracks one pipeline at a time so a caller
//! can build a right pipeline, close it into a side-table, then start the
//! left pipeline that reads it.

use crate::expr::Expr;
use crate::grouper::Grouper;
use crate::plan::{AggregateSpec, Comparator, OperatorKind, OperatorNode, Pipeline, Plan, ProjectionItem};
use crate::sidetable::SideTable;
use graphdb_core::{DictCode, Direction, PropertyValue};
use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

#[derive(Default)]
pub struct PlanBuilder {
    nodes: Vec<OperatorNode>,
    next_operator_id: i64,
    pipelines: Vec<Pipeline>,
    root: Option<usize>,
    tail: Option<usize>,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, kind: OperatorKind) -> Self {
        let idx = self.nodes.len();
        let operator_id = self.next_operator_id;
        self.next_operator_id += 1;
        self.nodes.push(OperatorNode { operator_id, kind, subscriber: None });
        match self.tail {
            Some(tail) => self.nodes[tail].subscriber = Some(idx),
            None => self.root = Some(idx),
        }
        self.tail = Some(idx);
        self
    }

    pub fn scan(self, labels: Vec<DictCode>) -> Self {
        self.push(OperatorKind::Scan { labels })
    }

    pub fn index_scan(self, label: DictCode, property: DictCode, value: PropertyValue) -> Self {
        self.push(OperatorKind::IndexScan { label, property, value })
    }

    pub fn foreach_relationship(self, dir: Direction, label: DictCode, hops: Option<(u32, u32)>) -> Self {
        self.push(OperatorKind::ForeachRelationship { dir, label, hops })
    }

    pub fn expand(self, dir: Direction, labels: Option<Vec<DictCode>>) -> Self {
        self.push(OperatorKind::Expand { dir, labels })
    }

    pub fn node_has_label(self, label: DictCode) -> Self {
        self.push(OperatorKind::NodeHasLabel { label })
    }

    pub fn filter(self, expr: Expr) -> Self {
        self.push(OperatorKind::FilterTuple { expr })
    }

    pub fn project(self, items: Vec<ProjectionItem>) -> Self {
        self.push(OperatorKind::Projection { items })
    }

    pub fn limit(self, n: usize) -> Self {
        self.push(OperatorKind::Limit { n, seen: AtomicUsize::new(0) })
    }

    pub fn order_by(self, comparator: Comparator) -> Self {
        self.push(OperatorKind::OrderBy { comparator, buffer: Default::default() })
    }

    pub fn group_by(self, key_positions: Vec<usize>, grouper: Arc<Grouper>) -> Self {
        self.push(OperatorKind::GroupBy { key_positions, grouper })
    }

    pub fn aggregate(self, grouper: Arc<Grouper>, specs: Vec<AggregateSpec>) -> Self {
        self.push(OperatorKind::Aggregate { grouper, specs })
    }

    pub fn distinct(self) -> Self {
        self.push(OperatorKind::Distinct { seen: Default::default() })
    }

    pub fn union_all(self) -> Self {
        self.push(OperatorKind::UnionAll)
    }

    /// Closes the current pipeline into `target`'s side-table. Call
    /// `finish_pipeline()` next to start the pipeline that reads it.
    pub fn end_pipeline(self, target: Arc<dyn SideTable>) -> Self {
        self.push(OperatorKind::EndPipeline { target })
    }

    pub fn cross_join(self, side: Arc<dyn SideTable>) -> Self {
        self.push(OperatorKind::CrossJoin { side })
    }

    pub fn nested_loop_join(self, left_pos: usize, right_pos: usize, side: Arc<dyn SideTable>) -> Self {
        self.push(OperatorKind::NestedLoopJoin { left_pos, right_pos, side })
    }

    pub fn hash_join(self, left_pos: usize, right_pos: usize, side: Arc<dyn SideTable>) -> Self {
        self.push(OperatorKind::HashJoin { left_pos, right_pos, side })
    }

    pub fn left_outer_join(self, left_pos: usize, right_pos: usize, side: Arc<dyn SideTable>) -> Self {
        self.push(OperatorKind::LeftOuterJoin { left_pos, right_pos, side })
    }

    pub fn shortest_path(self, label: DictCode, bidirectional: bool, all_paths: bool) -> Self {
        self.push(OperatorKind::ShortestPathOp { label, bidirectional, all_paths })
    }

    pub fn weighted_shortest_path(
        self,
        label: DictCode,
        weight_key: Option<DictCode>,
        bidirectional: bool,
        all_paths: bool,
    ) -> Self {
        self.push(OperatorKind::WeightedShortestPathOp { label, weight_key, bidirectional, all_paths })
    }

    pub fn k_weighted_shortest_path(
        self,
        label: DictCode,
        weight_key: Option<DictCode>,
        bidirectional: bool,
        k: usize,
    ) -> Self {
        self.push(OperatorKind::KWeightedShortestPathOp { label, weight_key, bidirectional, k })
    }

    pub fn create_node(self, label: DictCode, properties: HashMap<DictCode, PropertyValue>) -> Self {
        self.push(OperatorKind::CreateNode { label, properties })
    }

    pub fn create_relationship(
        self,
        label: DictCode,
        from_pos: usize,
        to_pos: usize,
        properties: HashMap<DictCode, PropertyValue>,
    ) -> Self {
        self.push(OperatorKind::CreateRelationship { label, from_pos, to_pos, properties })
    }

    pub fn update_node(self, properties: HashMap<DictCode, PropertyValue>) -> Self {
        self.push(OperatorKind::UpdateNode { properties })
    }

    pub fn detach_node(self) -> Self {
        self.push(OperatorKind::DetachNode)
    }

    pub fn remove_node(self) -> Self {
        self.push(OperatorKind::RemoveNode)
    }

    pub fn remove_relationship(self) -> Self {
        self.push(OperatorKind::RemoveRelationship)
    }

    /// Closes out the pipeline built so far and starts a fresh one; used
    /// between a right pipeline (ending in `end_pipeline`) and the left
    /// pipeline that probes its side-table.
    pub fn finish_pipeline(mut self) -> Self {
        if let Some(root) = self.root.take() {
            self.pipelines.push(Pipeline { root });
        }
        self.tail = None;
        self
    }

    pub fn build(self) -> Plan {
        let mut this = self.finish_pipeline();
        let pipelines = std::mem::take(&mut this.pipelines);
        Plan { nodes: this.nodes, pipelines }
    }
}
