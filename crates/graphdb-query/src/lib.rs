//! graphdb-query — the pipelined operator algebra, filter-expression
//! evaluator, grouper, join side-tables, and query driver (spec.md §2,
//! §4.3–§4.7).
//!
//! A `Plan` is an arena of `OperatorNode`s (spec.md §9: "a plan is an arena
//! of operator nodes addressed by indices"); a `QueryDriver` runs a plan's
//! pipelines against a `GraphStore`/`TransactionManager` pair and returns a
//! `ResultSet`.

pub mod driver;
pub mod error;
pub mod expr;
pub mod grouper;
pub mod plan;
pub mod plan_builder;
pub mod sidetable;

pub use driver::{PipelineProfile, QueryDriver};
pub use error::{diagnostic, QueryError};
pub use expr::{eval, Expr, Value};
pub use grouper::Grouper;
pub use plan::{
    AggregateKind, AggregateSpec, Comparator, ExecCtx, OperatorKind, OperatorNode, Pipeline, Plan,
    ProjectionItem, PushResult,
};
pub use plan_builder::PlanBuilder;
pub use sidetable::{CrossSideTable, HashSideTable, NestedLoopSideTable, SideTable};
