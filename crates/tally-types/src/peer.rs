//! Peer identifiers

use serde::de::{Error as DeError, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Identifier of a roster peer.
///
/// Numeric internally; every wire and disk format carries it as its
/// decimal string (`"1"`..`"5"` for the default roster).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Create from a raw numeric id.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw numeric id.
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// The id as it appears in a ballot triple.
    pub fn ballot_id(&self) -> i64 {
        i64::from(self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>().map(Self)
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NodeIdVisitor;

        impl Visitor<'_> for NodeIdVisitor {
            type Value = NodeId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a peer id string")
            }

            fn visit_str<E: DeError>(self, v: &str) -> Result<NodeId, E> {
                v.parse().map_err(E::custom)
            }

            // Lenient: some producers emit numeric peer ids.
            fn visit_u64<E: DeError>(self, v: u64) -> Result<NodeId, E> {
                u32::try_from(v).map(NodeId).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(NodeIdVisitor)
    }
}
