//! graphdb-core — identifiers, data model, and trait surfaces for the graph
//! query execution core.
//!
//! This crate defines the shapes everything else builds on: opaque node and
//! relationship identifiers, the node/relationship/property-set data model
//! with its transactional version headers, the tuple/cell sum type and
//! result set, and the `GraphStore`/`TransactionManager` trait surfaces the
//! rest of the workspace consumes. It has no storage or execution logic of
//! its own.

pub mod config;
pub mod direction;
pub mod error;
pub mod ids;
pub mod model;
pub mod store;
pub mod tuple;

pub use config::ExecConfig;
pub use direction::Direction;
pub use error::{Error, Result};
pub use ids::{DictCode, NodeId, RelId, Xid, UNKNOWN};
pub use model::{
    DirtyVersion, Node, PropertyBucket, PropertyItem, PropertyValue, Relationship, VersionHeader,
    PROPERTY_BUCKET_SIZE,
};
pub use store::{
    GraphStore, IndexHandle, NodeDescription, RelationshipDescription, TransactionManager,
    TxnFlag,
};
pub use tuple::{Cell, ResultSet, SharedResultSet, Tuple, TupleExt};
