//! Opaque identifiers for nodes, relationships, and dictionary codes.
//!
//! The original engine represents "no id" with the sentinel
//! `UNKNOWN = 2^64-1`. We keep that sentinel as the wire representation used
//! internally by the adjacency-list encoding (see `graphdb-txn`), but never
//! surface it through a safe API: every public accessor returns
//! `Option<NodeId>` / `Option<RelId>` instead.

use std::fmt;

/// Sentinel value for "no node/relationship" in the internal adjacency-list
/// encoding. Never returned from a public `GraphStore` method.
pub const UNKNOWN: u64 = u64::MAX;

/// 64-bit offset identifying a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

/// 64-bit offset identifying a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelId(pub u64);

/// 32-bit dictionary code for an interned label or string property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DictCode(pub u32);

macro_rules! offset_id {
    ($ty:ident, $repr:ty) => {
        impl $ty {
            /// Wraps a raw offset. Does not check against `UNKNOWN`.
            pub const fn new(raw: $repr) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> $repr {
                self.0
            }

            /// Converts the internal `UNKNOWN` sentinel into `None`.
            pub fn from_raw_opt(raw: $repr) -> Option<Self> {
                if raw == <$repr>::MAX {
                    None
                } else {
                    Some(Self(raw))
                }
            }

            /// Converts back to the sentinel encoding used by adjacency lists.
            pub fn to_raw_opt(opt: Option<Self>) -> $repr {
                match opt {
                    Some(id) => id.0,
                    None => <$repr>::MAX,
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

offset_id!(NodeId, u64);
offset_id!(RelId, u64);

impl DictCode {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DictCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A transaction identifier, monotonically allocated by the
/// `TransactionManager`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Xid(pub u64);

impl fmt::Display for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "xid:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_round_trips_through_option() {
        assert_eq!(NodeId::from_raw_opt(UNKNOWN), None);
        assert_eq!(NodeId::from_raw_opt(7), Some(NodeId(7)));
        assert_eq!(NodeId::to_raw_opt(None), UNKNOWN);
        assert_eq!(NodeId::to_raw_opt(Some(NodeId(7))), 7);
    }

    #[test]
    fn display_formats_are_distinct() {
        assert_eq!(NodeId(3).to_string(), "3");
        assert_eq!(DictCode(3).to_string(), "#3");
    }
}
