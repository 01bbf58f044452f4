//! Core graph types: identifiers, property owners, and entity records.
//!
//! Identifiers are surrogate integers allocated by the store. They are never
//! reused, so holding an id for a deleted entity is safe: lookups simply
//! report it as missing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Properties;

// ── Identifiers ───────────────────────────────────────────────────

/// Unique identifier for a node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct EdgeId(pub i64);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Property Owners ───────────────────────────────────────────────

/// The scope a property belongs to.
///
/// Graph-level properties form a single key space for the whole store;
/// node and edge properties are keyed by their owning entity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum Owner {
    Graph,
    Node(NodeId),
    Edge(EdgeId),
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Graph => write!(f, "graph"),
            Self::Node(id) => write!(f, "node {id}"),
            Self::Edge(id) => write!(f, "edge {id}"),
        }
    }
}

impl From<NodeId> for Owner {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<EdgeId> for Owner {
    fn from(id: EdgeId) -> Self {
        Self::Edge(id)
    }
}

// ── Traversal ─────────────────────────────────────────────────────

/// Which incident edges to follow from a node.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Edges where the node is the source.
    Outgoing,
    /// Edges where the node is the target.
    Incoming,
    /// Outgoing edges followed by incoming edges.
    #[default]
    Both,
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "outgoing" | "out" => Ok(Self::Outgoing),
            "incoming" | "in" => Ok(Self::Incoming),
            "both" => Ok(Self::Both),
            _ => Err(format!(
                "Invalid direction: {s}. Choose: outgoing, incoming, both"
            )),
        }
    }
}

/// An adjacent node together with the edge that connects it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Neighbor {
    pub edge_id: EdgeId,
    pub node_id: NodeId,
}

// ── Records ───────────────────────────────────────────────────────

/// A node with its label and every property it owns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub properties: Properties,
}

/// An edge with its endpoints, label, and every property it owns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub source_id: NodeId,
    pub target_id: NodeId,
    pub label: String,
    pub properties: Properties,
}

/// Row counts for a store.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphStats {
    pub nodes: u64,
    pub edges: u64,
    pub graph_properties: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_parses_aliases() {
        assert_eq!("outgoing".parse::<Direction>(), Ok(Direction::Outgoing));
        assert_eq!("IN".parse::<Direction>(), Ok(Direction::Incoming));
        assert_eq!("both".parse::<Direction>(), Ok(Direction::Both));
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn owner_display() {
        assert_eq!(Owner::Graph.to_string(), "graph");
        assert_eq!(Owner::from(NodeId(3)).to_string(), "node 3");
        assert_eq!(Owner::from(EdgeId(9)).to_string(), "edge 9");
    }

    #[test]
    fn node_record_serializes_flat_ids() {
        let node = Node {
            id: NodeId(1),
            label: "Program".to_string(),
            properties: Properties::new(),
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["label"], "Program");
    }
}
