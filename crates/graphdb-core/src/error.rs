//! Shared error type for the graph query execution core.
//!
//! One variant per failure kind from the specification's error design:
//! `UnknownProperty`, `TypeMismatch`, `UnknownLabel`, `TransactionAborted`,
//! `DeadlockDetected`, `IndexMiss`, `PathNotFound`, `InvalidPlan`.
//!
//! `IndexMiss` and `PathNotFound` are ordinary empty results, not `Err`
//! values — callers that hit them return `Ok` with an empty collection.
//! The variants exist here only so the driver's fatal-diagnostic message
//! can name a kind uniformly when it does need to report one.

use thiserror::Error;

/// Result type alias using the core's `Error`.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("operator {operator_id}: unknown property {key}")]
    UnknownProperty { operator_id: i64, key: String },

    #[error("operator {operator_id}: type mismatch, expected {expected}, found {found}")]
    TypeMismatch {
        operator_id: i64,
        expected: String,
        found: String,
    },

    #[error("unknown label: {0}")]
    UnknownLabel(String),

    #[error("transaction aborted: {0}")]
    TransactionAborted(String),

    #[error("deadlock detected waiting on {0}")]
    DeadlockDetected(String),

    #[error("index miss")]
    IndexMiss,

    #[error("path not found")]
    PathNotFound,

    #[error("operator {operator_id}: invalid plan, missing right side-table")]
    InvalidPlan { operator_id: i64 },
}

impl Error {
    /// Short machine-stable name for the kind, used in the driver's single
    /// fatal diagnostic (spec.md §7: "a single diagnostic naming the
    /// operator id and kind").
    pub fn kind_name(&self) -> &'static str {
        match self {
            Error::UnknownProperty { .. } => "UnknownProperty",
            Error::TypeMismatch { .. } => "TypeMismatch",
            Error::UnknownLabel(_) => "UnknownLabel",
            Error::TransactionAborted(_) => "TransactionAborted",
            Error::DeadlockDetected(_) => "DeadlockDetected",
            Error::IndexMiss => "IndexMiss",
            Error::PathNotFound => "PathNotFound",
            Error::InvalidPlan { .. } => "InvalidPlan",
        }
    }

    /// Whether the spec treats this kind as a fatal, unwind-to-driver error
    /// rather than an ordinary empty result (spec.md §7).
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::IndexMiss | Error::PathNotFound)
    }
}
