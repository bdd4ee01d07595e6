//! Query driver (spec.md §4.7): builds a per-thread `ExecCtx`, runs each
//! pipeline's driving scan chunk-parallel, then its finish-phase callbacks,
//! in reverse pipeline order so every binary operator's right side-table is
//! fully materialized before its left-side consumer runs (spec.md §2, §5).

use crate::error::diagnostic;
use crate::plan::{ExecCtx, OperatorKind, Plan, PushResult};
use graphdb_core::{
    Cell, DictCode, Error, ExecConfig, GraphStore, NodeId, Result, ResultSet, SharedResultSet,
    TransactionManager, Tuple,
};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Per-pipeline wall-clock timing, gathered when `ExecConfig::profile` is
/// set (spec.md §4.7 "emit per-operator timing if profiling is enabled").
/// Keyed by the pipeline's root `operator_id` since the interpreter runs a
/// whole pipeline as one push/finish unit rather than instrumenting each
/// node of the chain individually.
#[derive(Debug, Clone)]
pub struct PipelineProfile {
    pub pipeline_index: usize,
    pub root_operator_id: i64,
    pub duration: Duration,
}

/// Drives a `Plan` to completion against a `GraphStore`/`TransactionManager`
/// pair, producing a `ResultSet` (spec.md §4.7).
pub struct QueryDriver<'a> {
    store: &'a dyn GraphStore,
    txn_mgr: &'a dyn TransactionManager,
    config: ExecConfig,
}

impl<'a> QueryDriver<'a> {
    pub fn new(store: &'a dyn GraphStore, txn_mgr: &'a dyn TransactionManager) -> Self {
        Self::with_config(store, txn_mgr, ExecConfig::default())
    }

    pub fn with_config(store: &'a dyn GraphStore, txn_mgr: &'a dyn TransactionManager, config: ExecConfig) -> Self {
        Self { store, txn_mgr, config }
    }

    /// Runs every pipeline of `plan` under a fresh transaction, committing on
    /// success and aborting on the first fatal error (spec.md §4.7, §7:
    /// "the driver aborts the transaction and surfaces the error;
    /// intermediate result sets are discarded").
    pub fn execute(&self, plan: &Plan) -> Result<(SharedResultSet, Vec<PipelineProfile>)> {
        let xid = self.txn_mgr.begin();
        let result_set: SharedResultSet = std::sync::Arc::new(ResultSet::new());
        match self.run_pipelines(plan, xid, &result_set) {
            Ok(profiles) => {
                self.txn_mgr.commit(xid)?;
                result_set.notify();
                Ok((result_set, profiles))
            }
            Err(err) => {
                warn!(diagnostic = %diagnostic(&err), "aborting transaction");
                self.txn_mgr.abort(xid);
                result_set.replace(Vec::new());
                Err(err)
            }
        }
    }

    /// Iterates `plan.pipelines` last-to-first (spec.md §2, §4.7): the list
    /// is built during plan compilation so that every pipeline feeding a
    /// binary operator's side-table appears after the pipelines it depends
    /// on, and before the pipeline that reads it.
    fn run_pipelines(
        &self,
        plan: &Plan,
        xid: graphdb_core::Xid,
        result_set: &SharedResultSet,
    ) -> Result<Vec<PipelineProfile>> {
        let mut profiles = Vec::new();
        for (pipeline_index, pipeline) in plan.pipelines.iter().enumerate().rev() {
            let start = Instant::now();
            let ctx = ExecCtx {
                store: self.store,
                xid,
                config: &self.config,
                result_set: result_set.as_ref(),
            };
            self.run_pipeline(plan, pipeline.root, &ctx)?;
            for idx in chain_from(plan, pipeline.root) {
                plan.finish(idx, &ctx)?;
            }
            if self.config.profile {
                let duration = start.elapsed();
                debug!(pipeline_index, root = plan.nodes[pipeline.root].operator_id, ?duration, "pipeline finished");
                profiles.push(PipelineProfile {
                    pipeline_index,
                    root_operator_id: plan.nodes[pipeline.root].operator_id,
                    duration,
                });
            }
        }
        Ok(profiles)
    }

    /// Runs one pipeline's driving source: a chunk-parallel node scan for
    /// `Scan`/`IndexScan`, a single push for a `CreateNode` DML source with
    /// no upstream tuple, or nothing at all for a pipeline rooted directly
    /// in a finish-time operator (`GroupBy`/`Aggregate`/`OrderBy`/
    /// `Distinct` reading a grouper/buffer another pipeline already
    /// populated — their output comes entirely from `Plan::finish`,
    /// spec.md §4.3, §5 "parallel threads over disjoint chunks of the node
    /// vector for scan-rooted pipelines").
    fn run_pipeline(&self, plan: &Plan, root: usize, ctx: &ExecCtx) -> Result<()> {
        match &plan.nodes[root].kind {
            OperatorKind::Scan { labels } => self.run_scan(plan, root, labels, ctx),
            OperatorKind::IndexScan { label, property, value } => {
                self.run_index_scan(plan, root, *label, *property, value, ctx)
            }
            OperatorKind::CreateNode { .. } => {
                plan.push(root, Tuple::new(), ctx)?;
                Ok(())
            }
            OperatorKind::GroupBy { .. } | OperatorKind::Aggregate { .. } | OperatorKind::OrderBy { .. } => {
                Ok(())
            }
            _ => {
                plan.push(root, Tuple::new(), ctx)?;
                Ok(())
            }
        }
    }

    fn run_scan(&self, plan: &Plan, root: usize, labels: &[DictCode], ctx: &ExecCtx) -> Result<()> {
        let chunks = self.config.resolved_scan_chunks();
        let stop = AtomicBool::new(false);
        let errors: std::sync::Mutex<Vec<Error>> = std::sync::Mutex::new(Vec::new());
        (0..chunks).into_par_iter().for_each(|chunk| {
            if stop.load(Ordering::Relaxed) {
                return;
            }
            let range = self.store.node_chunk_range(chunk, chunks);
            for offset in range {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                let id = NodeId::new(offset);
                let node = match self.store.get_valid_node_version(id, ctx.xid) {
                    Ok(n) => n,
                    Err(_) => continue, // not visible to this transaction
                };
                if !labels.is_empty() && !labels.contains(&node.label) {
                    continue;
                }
                match plan.push(root, vec![Cell::Node(id)], ctx) {
                    Ok(PushResult::StopPipeline) => {
                        stop.store(true, Ordering::Relaxed);
                        break;
                    }
                    Ok(PushResult::Continue) => {}
                    Err(e) => {
                        errors.lock().unwrap().push(e);
                        stop.store(true, Ordering::Relaxed);
                        break;
                    }
                }
            }
        });
        match errors.into_inner().unwrap().into_iter().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn run_index_scan(
        &self,
        plan: &Plan,
        root: usize,
        label: DictCode,
        property: DictCode,
        value: &graphdb_core::PropertyValue,
        ctx: &ExecCtx,
    ) -> Result<()> {
        let Some(handle) = self.store.get_index(label, property) else {
            return Ok(()); // IndexMiss is an ordinary empty result (spec.md §7)
        };
        for id in self.store.index_lookup(handle, value) {
            if plan.push(root, vec![Cell::Node(id)], ctx)? == PushResult::StopPipeline {
                break;
            }
        }
        Ok(())
    }
}

/// Walks the linear chain of operator indices from `root` to the pipeline's
/// terminal operator, following `subscriber` links (spec.md §2's "left-deep
/// chain of unary operators"). Used to run `finish()` over every node of a
/// pipeline in upstream-to-downstream order.
fn chain_from(plan: &Plan, root: usize) -> Vec<usize> {
    let mut out = Vec::new();
    let mut cur = Some(root);
    while let Some(idx) = cur {
        out.push(idx);
        cur = plan.nodes[idx].subscriber;
    }
    out
}

/// Convenience re-export so callers building an argument vector per
/// operator (spec.md §4.7) can look values up by `operator_id` without
/// reaching into `plan` internals.
pub fn args_by_operator_id(plan: &Plan) -> HashMap<i64, usize> {
    plan.nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| (node.operator_id, idx))
        .collect()
}
