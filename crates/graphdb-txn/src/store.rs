//! In-memory transactional `GraphStore`: adjacency lists, chained
//! property-set buckets, a label/property index, and the dictionary,
//! generalized from `parsnip-storage::memory::MemoryStorage`'s
//! everything-behind-a-lock shape to the adjacency-linked-list and MVCC
//! version-header model of spec.md §3/§4.1/§9.

use crate::dictionary::Dictionary;
use crate::txn::InMemoryTxnManager;
use graphdb_core::{
    DictCode, DirtyVersion, Error, ExecConfig, GraphStore, IndexHandle, Node, NodeDescription,
    NodeId, PropertyBucket, PropertyItem, PropertyValue, RelId, Relationship,
    RelationshipDescription, Result, TransactionManager, TxnFlag, VersionHeader, Xid,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Transaction id reserved for entities considered always-committed (used
/// for test fixtures and for Yen's algorithm restoring a relationship it
/// had temporarily deleted). Never allocated by `InMemoryTxnManager::begin`.
pub const GENESIS: Xid = Xid(u64::MAX);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
enum Owner {
    Node(u64),
    Rel(u64),
}

/// In-memory `GraphStore`. All structural mutation (node/relationship
/// creation, property writes, deletes) is serialized through `mutator`,
/// matching spec.md §5's "DML operators take the graph mutator lock per
/// mutation" — reads of `nodes`/`rships` use their own `RwLock` so
/// scan-rooted pipelines can run concurrently against a quiescent graph.
pub struct MemoryGraphStore {
    dictionary: Dictionary,
    txn_mgr: Arc<InMemoryTxnManager>,
    config: ExecConfig,
    mutator: Mutex<()>,
    nodes: RwLock<Vec<Node>>,
    rships: RwLock<Vec<Relationship>>,
    buckets: RwLock<HashMap<u64, PropertyBucket>>,
    next_bucket_id: AtomicU64,
    index_defs: RwLock<HashMap<(DictCode, DictCode), IndexHandle>>,
    index_data: RwLock<HashMap<u64, Vec<(PropertyValue, NodeId)>>>,
    next_index_id: AtomicU64,
}

impl MemoryGraphStore {
    pub fn new(txn_mgr: Arc<InMemoryTxnManager>) -> Self {
        Self::with_config(txn_mgr, ExecConfig::default())
    }

    pub fn with_config(txn_mgr: Arc<InMemoryTxnManager>, config: ExecConfig) -> Self {
        Self {
            dictionary: Dictionary::new(),
            txn_mgr,
            config,
            mutator: Mutex::new(()),
            nodes: RwLock::new(Vec::new()),
            rships: RwLock::new(Vec::new()),
            buckets: RwLock::new(HashMap::new()),
            next_bucket_id: AtomicU64::new(0),
            index_defs: RwLock::new(HashMap::new()),
            index_data: RwLock::new(HashMap::new()),
            next_index_id: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    pub fn txn_manager(&self) -> &Arc<InMemoryTxnManager> {
        &self.txn_mgr
    }

    fn version_xmin(&self, txn_flag: TxnFlag, xid: Xid) -> Xid {
        match txn_flag {
            TxnFlag::Dirty => xid,
            TxnFlag::Committed => GENESIS,
        }
    }

    /// Resolves the entity as it should be seen by `xid`: the dirty
    /// overlay if locked by and valid for `xid`, the base version if
    /// visible per MVCC snapshot rules, or `None` if neither applies
    /// (spec.md §4.1, §9).
    fn visible_label(&self, version: &VersionHeader, base_label: DictCode, xid: Xid) -> Option<DictCode> {
        if self.txn_mgr.is_locked_by(version, xid) {
            if self.txn_mgr.has_valid_version(version, xid) {
                Some(version.dirty.as_ref().and_then(|d| d.label).unwrap_or(base_label))
            } else {
                None
            }
        } else if self.txn_mgr.is_valid_for(version, xid) {
            Some(base_label)
        } else {
            None
        }
    }

    fn rship_visible(&self, r: &Relationship, xid: Xid) -> bool {
        self.visible_label(&r.version, r.label, xid).is_some()
    }

    fn node_slot(&self, id: NodeId) -> Node {
        self.nodes
            .read()
            .get(id.raw() as usize)
            .cloned()
            .unwrap_or_else(|| panic!("invariant: node id {id} never allocated"))
    }

    fn rship_slot(&self, id: RelId) -> Relationship {
        self.rships
            .read()
            .get(id.raw() as usize)
            .cloned()
            .unwrap_or_else(|| panic!("invariant: relationship id {id} never allocated"))
    }

    fn owner_key(owner: Owner) -> u64 {
        match owner {
            Owner::Node(id) => id,
            Owner::Rel(id) => id,
        }
    }

    /// Sets `key = value` in the property chain rooted at `*head`,
    /// overwriting an existing item for `key` anywhere in the chain
    /// (preserving the chain's key-uniqueness invariant) or appending a new
    /// item to the tail bucket, allocating a fresh bucket when the tail is
    /// full. Must run under `mutator`.
    fn set_property(&self, head: &mut Option<u64>, owner: Owner, key: DictCode, value: PropertyValue) {
        let mut buckets = self.buckets.write();
        let mut cursor = *head;
        let mut tail = None;
        while let Some(bucket_id) = cursor {
            let bucket = buckets.get_mut(&bucket_id).expect("bucket chain intact");
            if let Some(item) = bucket.items.iter_mut().find(|item| item.key == key) {
                item.value = value;
                return;
            }
            tail = Some(bucket_id);
            cursor = bucket.next_bucket;
        }

        match tail.and_then(|id| buckets.get_mut(&id)).filter(|b| !b.is_full()) {
            Some(bucket) => {
                bucket.items.push(PropertyItem { key, value });
            }
            None => {
                let new_id = self.next_bucket_id.fetch_add(1, Ordering::SeqCst);
                let mut bucket = PropertyBucket::new(Self::owner_key(owner));
                bucket.items.push(PropertyItem { key, value });
                if let Some(tail_id) = tail {
                    buckets.get_mut(&tail_id).unwrap().next_bucket = Some(new_id);
                } else {
                    *head = Some(new_id);
                }
                buckets.insert(new_id, bucket);
            }
        }
    }

    fn write_properties(&self, head: &mut Option<u64>, owner: Owner, properties: HashMap<DictCode, PropertyValue>) {
        for (key, value) in properties {
            self.set_property(head, owner, key, value);
        }
    }

    /// Reads the full property map for an owner by walking its chain, per
    /// spec.md §4.5's bucket-chain lookup shape.
    pub fn read_properties(&self, head: Option<u64>) -> HashMap<DictCode, PropertyValue> {
        let buckets = self.buckets.read();
        let mut out = HashMap::new();
        let mut cursor = head;
        while let Some(bucket_id) = cursor {
            let bucket = buckets.get(&bucket_id).expect("bucket chain intact");
            for item in &bucket.items {
                out.insert(item.key, item.value.clone());
            }
            cursor = bucket.next_bucket;
        }
        out
    }

    pub fn find_property(&self, head: Option<u64>, key: DictCode) -> Option<PropertyValue> {
        let buckets = self.buckets.read();
        let mut cursor = head;
        while let Some(bucket_id) = cursor {
            let bucket = buckets.get(&bucket_id).expect("bucket chain intact");
            if let Some(v) = bucket.find(key) {
                return Some(v.clone());
            }
            cursor = bucket.next_bucket;
        }
        None
    }

}

impl GraphStore for MemoryGraphStore {
    fn node_count(&self) -> usize {
        self.nodes.read().len()
    }

    fn relationship_count(&self) -> usize {
        self.rships.read().len()
    }

    fn node_chunk_range(&self, chunk: usize, chunks: usize) -> Range<u64> {
        let total = self.node_count() as u64;
        let chunks = chunks.max(1) as u64;
        let per_chunk = total.div_ceil(chunks).max(1);
        let first = (chunk as u64) * per_chunk;
        let last = (first + per_chunk).min(total);
        first..last.max(first)
    }

    fn node_by_id(&self, id: NodeId) -> Result<Node> {
        Ok(self.node_slot(id))
    }

    fn rship_by_id(&self, id: RelId) -> Result<Relationship> {
        Ok(self.rship_slot(id))
    }

    fn get_valid_node_version(&self, node: NodeId, xid: Xid) -> Result<Node> {
        let n = self.node_slot(node);
        match self.visible_label(&n.version, n.label, xid) {
            Some(label) => Ok(Node { label, ..n }),
            None => Err(Error::TransactionAborted(format!(
                "node {node} has no version visible to {xid}"
            ))),
        }
    }

    fn get_valid_rship_version(&self, rship: RelId, xid: Xid) -> Result<Relationship> {
        let r = self.rship_slot(rship);
        match self.visible_label(&r.version, r.label, xid) {
            Some(label) => Ok(Relationship { label, ..r }),
            None => Err(Error::TransactionAborted(format!(
                "relationship {rship} has no version visible to {xid}"
            ))),
        }
    }

    fn get_code(&self, s: &str) -> DictCode {
        self.dictionary.get_code(s)
    }

    fn get_string(&self, code: DictCode) -> Option<String> {
        self.dictionary.get_string(code)
    }

    fn get_node_description(&self, id: NodeId) -> Result<NodeDescription> {
        let n = self.node_slot(id);
        Ok(NodeDescription {
            id: n.id,
            label: n.label,
            properties: self.read_properties(n.first_property_set),
        })
    }

    fn get_rship_description(&self, id: RelId) -> Result<RelationshipDescription> {
        let r = self.rship_slot(id);
        Ok(RelationshipDescription {
            id: r.id,
            label: r.label,
            from_id: r.src,
            to_id: r.dst,
            properties: self.read_properties(r.first_property_set),
        })
    }

    fn add_node(
        &self,
        label: DictCode,
        properties: HashMap<DictCode, PropertyValue>,
        txn_flag: TxnFlag,
        xid: Xid,
    ) -> Result<NodeId> {
        let _guard = self.mutator.lock();
        let xmin = self.version_xmin(txn_flag, xid);
        let id = {
            let mut nodes = self.nodes.write();
            let id = NodeId::new(nodes.len() as u64);
            nodes.push(Node::new(id, label, xmin));
            id
        };
        let mut head = None;
        self.write_properties(&mut head, Owner::Node(id.raw()), properties);
        if head.is_some() {
            self.nodes.write()[id.raw() as usize].first_property_set = head;
        }
        Ok(id)
    }

    fn add_relationship(
        &self,
        src: NodeId,
        dst: NodeId,
        label: DictCode,
        properties: HashMap<DictCode, PropertyValue>,
        txn_flag: TxnFlag,
        xid: Xid,
    ) -> Result<RelId> {
        let _guard = self.mutator.lock();
        let xmin = self.version_xmin(txn_flag, xid);
        let id = {
            let mut rships = self.rships.write();
            let id = RelId::new(rships.len() as u64);
            let mut r = Relationship::new(id, label, src, dst, xmin);

            let mut nodes = self.nodes.write();
            let src_node = &mut nodes[src.raw() as usize];
            r.next_out_of_src = src_node.first_outgoing;
            src_node.first_outgoing = Some(id);
            let dst_node = &mut nodes[dst.raw() as usize];
            r.next_in_of_dst = dst_node.first_incoming;
            dst_node.first_incoming = Some(id);

            rships.push(r);
            id
        };
        let mut head = None;
        self.write_properties(&mut head, Owner::Rel(id.raw()), properties);
        if head.is_some() {
            self.rships.write()[id.raw() as usize].first_property_set = head;
        }
        Ok(id)
    }

    fn update_node(
        &self,
        id: NodeId,
        properties: HashMap<DictCode, PropertyValue>,
        xid: Xid,
    ) -> Result<()> {
        let _guard = self.mutator.lock();
        let mut nodes = self.nodes.write();
        let node = nodes
            .get_mut(id.raw() as usize)
            .ok_or_else(|| Error::UnknownLabel(format!("node {id}")))?;
        if node.version.owner.is_none() {
            node.version.owner = Some(xid);
        }
        let mut head = node.first_property_set;
        drop(nodes);
        self.write_properties(&mut head, Owner::Node(id.raw()), properties);
        self.nodes.write()[id.raw() as usize].first_property_set = head;
        Ok(())
    }

    fn detach_node(&self, id: NodeId, xid: Xid) -> Result<()> {
        let _guard = self.mutator.lock();
        let node = self.node_slot(id);
        let mut out_ids = Vec::new();
        let mut rid = node.first_outgoing;
        while let Some(r) = rid {
            out_ids.push(r);
            rid = self.rship_slot(r).next_out_of_src;
        }
        let mut in_ids = Vec::new();
        rid = node.first_incoming;
        while let Some(r) = rid {
            in_ids.push(r);
            rid = self.rship_slot(r).next_in_of_dst;
        }
        let mut rships = self.rships.write();
        for r in out_ids.into_iter().chain(in_ids) {
            let version = &mut rships[r.raw() as usize].version;
            version.owner = Some(xid);
            version.dirty = Some(DirtyVersion {
                writer: xid,
                label: None,
                detached: true,
            });
        }
        Ok(())
    }

    fn remove_node(&self, id: NodeId, xid: Xid) -> Result<()> {
        let _guard = self.mutator.lock();
        let mut nodes = self.nodes.write();
        let node = nodes
            .get_mut(id.raw() as usize)
            .ok_or_else(|| Error::UnknownLabel(format!("node {id}")))?;
        node.version.xmax = Some(xid);
        Ok(())
    }

    fn delete_relationship(&self, id: RelId) -> Result<()> {
        let _guard = self.mutator.lock();
        let mut rships = self.rships.write();
        let r = rships
            .get_mut(id.raw() as usize)
            .ok_or_else(|| Error::UnknownLabel(format!("relationship {id}")))?;
        r.version.xmax = Some(GENESIS);
        Ok(())
    }

    fn delete_relationship_txn(&self, id: RelId, xid: Xid) -> Result<()> {
        let _guard = self.mutator.lock();
        let mut rships = self.rships.write();
        let r = rships
            .get_mut(id.raw() as usize)
            .ok_or_else(|| Error::UnknownLabel(format!("relationship {id}")))?;
        r.version.owner = Some(xid);
        r.version.dirty = Some(DirtyVersion {
            writer: xid,
            label: None,
            detached: true,
        });
        Ok(())
    }

    fn get_index(&self, label: DictCode, property: DictCode) -> Option<IndexHandle> {
        self.index_defs.read().get(&(label, property)).copied()
    }

    fn index_lookup(&self, idx: IndexHandle, value: &PropertyValue) -> Vec<NodeId> {
        self.index_data
            .read()
            .get(&idx.0)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(v, _)| v == value)
                    .map(|(_, id)| *id)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn foreach_from_relationship_of_node(
        &self,
        n: NodeId,
        xid: Xid,
        visit: &mut dyn FnMut(&Relationship),
    ) -> Result<()> {
        let node = self.node_slot(n);
        let mut rid = node.first_outgoing;
        while let Some(id) = rid {
            let r = self.rship_slot(id);
            rid = r.next_out_of_src;
            if self.rship_visible(&r, xid) {
                visit(&r);
            }
        }
        Ok(())
    }

    fn foreach_to_relationship_of_node(
        &self,
        n: NodeId,
        xid: Xid,
        visit: &mut dyn FnMut(&Relationship),
    ) -> Result<()> {
        let node = self.node_slot(n);
        let mut rid = node.first_incoming;
        while let Some(id) = rid {
            let r = self.rship_slot(id);
            rid = r.next_in_of_dst;
            if self.rship_visible(&r, xid) {
                visit(&r);
            }
        }
        Ok(())
    }

}

impl MemoryGraphStore {
    /// Builds (or rebuilds) a secondary index over `(label, property)` by
    /// scanning every node currently visible to `GENESIS` (i.e. every
    /// committed node). Index *construction* algorithms are out of scope
    /// per spec.md §1; this is the minimal bootstrap the `IndexScan`
    /// operator's external interface needs to have something to query.
    pub fn create_index(&self, label: DictCode, property: DictCode) -> IndexHandle {
        let _guard = self.mutator.lock();
        if let Some(handle) = self.get_index(label, property) {
            return handle;
        }
        let handle = IndexHandle(self.next_index_id.fetch_add(1, Ordering::SeqCst));
        let mut entries = Vec::new();
        for node in self.nodes.read().iter() {
            if node.label != label {
                continue;
            }
            if self.visible_label(&node.version, node.label, GENESIS).is_none() {
                continue;
            }
            if let Some(value) = self.find_property(node.first_property_set, property) {
                entries.push((value, node.id));
            }
        }
        self.index_defs.write().insert((label, property), handle);
        self.index_data.write().insert(handle.0, entries);
        handle
    }
}
