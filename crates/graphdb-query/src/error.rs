//! Query-engine error handling (spec.md §7). `graphdb_core::Error` already
//! carries the full kind list (`InvalidPlan` included), so this module only
//! adds the driver's fatal-diagnostic formatting — no separate error type.

pub use graphdb_core::{Error as QueryError, Result};

/// The single diagnostic the driver surfaces on abort: operator id plus
/// error kind, no partial results (spec.md §7).
pub fn diagnostic(err: &QueryError) -> String {
    match err {
        QueryError::UnknownProperty { operator_id, .. }
        | QueryError::TypeMismatch { operator_id, .. }
        | QueryError::InvalidPlan { operator_id } => {
            format!("operator {operator_id} failed: {}", err.kind_name())
        }
        other => format!("query failed: {}", other.kind_name()),
    }
}
