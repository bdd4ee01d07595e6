//! graphdb-txn — the transaction manager and an in-memory transactional
//! `GraphStore` implementation (spec.md §3, §4.1, §6, §9).
//!
//! This crate is the "engine" backing store: MVCC snapshotting and xid
//! allocation (`txn`), a minimal string interner (`dictionary`), and
//! adjacency lists, chained property-set buckets, and a label/property
//! index over them (`store`). Everything above this crate talks only to
//! the `GraphStore`/`TransactionManager` traits from `graphdb-core`.

pub mod dictionary;
pub mod store;
pub mod txn;

pub use dictionary::Dictionary;
pub use store::{MemoryGraphStore, GENESIS};
pub use txn::InMemoryTxnManager;
