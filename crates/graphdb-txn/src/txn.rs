//! Transaction lifecycle and MVCC visibility (spec.md §3, §6, §9).
//!
//! A version is visible to `xid` iff its writer has already committed (and
//! committed before the reader could have started using it) or the reader
//! is itself the writer ("see own writes"); a version that has since been
//! retired (`xmax` set) is invisible once its retirer has committed, unless
//! the reader is the one retiring it.

use graphdb_core::{Error, Result, TransactionManager as TransactionManagerTrait, VersionHeader, Xid};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Transaction manager backing the in-memory `GraphStore`. Tracks which
/// transaction ids have committed; xid allocation is a simple monotonic
/// counter (spec.md §9's "cyclic graphs with shared ownership" note applies
/// to the operator plan, not to xid allocation, which has no such
/// constraint).
#[derive(Debug, Default)]
pub struct InMemoryTxnManager {
    next_xid: AtomicU64,
    committed: RwLock<HashSet<u64>>,
    aborted: RwLock<HashSet<u64>>,
}

impl InMemoryTxnManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// `GENESIS` (see `crate::store`) is always considered committed: it
    /// marks entities that are part of the graph's committed baseline
    /// rather than any live transaction's write set.
    pub fn is_committed(&self, xid: Xid) -> bool {
        xid == crate::store::GENESIS || self.committed.read().contains(&xid.0)
    }

    pub fn is_aborted(&self, xid: Xid) -> bool {
        self.aborted.read().contains(&xid.0)
    }
}

impl TransactionManagerTrait for InMemoryTxnManager {
    fn begin(&self) -> Xid {
        Xid(self.next_xid.fetch_add(1, Ordering::SeqCst))
    }

    fn commit(&self, xid: Xid) -> Result<()> {
        if self.aborted.read().contains(&xid.0) {
            return Err(Error::TransactionAborted(format!(
                "{xid} cannot commit after abort"
            )));
        }
        self.committed.write().insert(xid.0);
        Ok(())
    }

    fn abort(&self, xid: Xid) {
        self.aborted.write().insert(xid.0);
    }

    fn is_locked_by(&self, version: &VersionHeader, xid: Xid) -> bool {
        version.owner == Some(xid)
    }

    fn has_dirty_versions(&self, version: &VersionHeader) -> bool {
        version.dirty.is_some()
    }

    fn has_valid_version(&self, version: &VersionHeader, xid: Xid) -> bool {
        self.is_locked_by(version, xid)
            && version
                .dirty
                .as_ref()
                .is_some_and(|d| d.writer == xid && !d.detached)
    }

    fn is_valid_for(&self, version: &VersionHeader, xid: Xid) -> bool {
        let creator_is_reader = version.xmin == xid;
        let creator_committed = self.is_committed(version.xmin);
        if !creator_is_reader && !creator_committed {
            return false;
        }
        match version.xmax {
            None => true,
            Some(retirer) => !(retirer == xid || self.is_committed(retirer)),
        }
    }
}
