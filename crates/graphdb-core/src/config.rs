//! Execution-wide configuration knobs, carrying the sentinel defaults from
//! spec.md §6. Follows the builder-method style `SearchQuery` uses in the
//! teacher crate for its own config structs.

/// Tunables shared by the join side-tables, the property-bucket chain, and
/// the query driver's concurrency level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecConfig {
    /// Number of buckets a hash side-table hashes entity ids into
    /// (`hash(id) = id % hash_buckets`). Spec.md §6 default: 10.
    pub hash_buckets: usize,
    /// Items per property-set bucket before chaining. Spec.md §6 default: 3.
    pub property_bucket_items: usize,
    /// Whether the driver collects per-operator timing (spec.md §4.7).
    pub profile: bool,
    /// Number of chunks a scan-rooted pipeline splits the node vector into.
    /// `None` defaults to the available parallelism.
    pub scan_chunks: Option<usize>,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            hash_buckets: 10,
            property_bucket_items: crate::model::PROPERTY_BUCKET_SIZE,
            profile: false,
            scan_chunks: None,
        }
    }
}

impl ExecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hash_buckets(mut self, n: usize) -> Self {
        self.hash_buckets = n;
        self
    }

    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.profile = enabled;
        self
    }

    pub fn with_scan_chunks(mut self, n: usize) -> Self {
        self.scan_chunks = Some(n);
        self
    }

    pub fn resolved_scan_chunks(&self) -> usize {
        self.scan_chunks.unwrap_or_else(num_cpus::get).max(1)
    }
}
